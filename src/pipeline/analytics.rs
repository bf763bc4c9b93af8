//! Derived engagement metrics. Everything here is a pure function of a
//! video's counters, its publish time and the caller-supplied `now`.

use crate::config::AnalyticsConfig;
use crate::types::VideoAnalytics;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

/// Parse a platform timestamp (RFC 3339).
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whole days since publication, floored; future timestamps give 0.
pub fn days_since_published(published_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - published_at).num_days().max(0)
}

/// Views per day, dividing by at least `min_day_floor` days.
pub fn growth_rate(views: u64, days: i64, config: &AnalyticsConfig) -> f64 {
    let denominator = days.max(config.min_day_floor).max(1);
    views as f64 / denominator as f64
}

/// `count / views`, or 0 when there are no views.
pub fn ratio(count: u64, views: u64) -> f64 {
    if views == 0 {
        0.0
    } else {
        count as f64 / views as f64
    }
}

pub fn engagement_rate(like_rate: f64, comment_rate: f64, config: &AnalyticsConfig) -> f64 {
    like_rate * config.like_weight + comment_rate * config.comment_weight
}

/// Fast growth only counts while the video is still recent.
pub fn is_trending(growth_rate: f64, days: i64, config: &AnalyticsConfig) -> bool {
    growth_rate > config.trending_growth_threshold && days <= config.trending_recency_days
}

pub fn is_new(days: i64, config: &AnalyticsConfig) -> bool {
    days <= config.new_recency_days
}

/// Compute every derived field for one record.
///
/// An unknown publish time counts as zero days old for the rates, but never
/// earns the `new` or `trending` badges.
pub fn compute(
    counters: Counters,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &AnalyticsConfig,
) -> VideoAnalytics {
    let days = published_at
        .map(|published| days_since_published(published, now))
        .unwrap_or(0);
    let growth = growth_rate(counters.views, days, config);
    let comment_rate = ratio(counters.comments, counters.views);
    let like_rate = ratio(counters.likes, counters.views);

    VideoAnalytics {
        days_since_published: days,
        growth_rate: growth,
        comment_rate,
        like_rate,
        engagement_rate: engagement_rate(like_rate, comment_rate, config),
        is_trending: published_at.is_some() && is_trending(growth, days, config),
        is_new: published_at.is_some() && is_new(days, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_floor_and_clamp() {
        let cfg_now = now();
        assert_eq!(days_since_published(cfg_now - Duration::hours(47), cfg_now), 1);
        assert_eq!(days_since_published(cfg_now - Duration::days(10), cfg_now), 10);
        assert_eq!(days_since_published(cfg_now + Duration::days(3), cfg_now), 0);
    }

    #[test]
    fn test_growth_rate_uses_day_floor() {
        let cfg = AnalyticsConfig::default();
        assert_eq!(growth_rate(5_000, 0, &cfg), 5_000.0);
        assert_eq!(growth_rate(5_000, 1, &cfg), 5_000.0);
        assert_eq!(growth_rate(5_000, 10, &cfg), 500.0);
    }

    #[test]
    fn test_growth_rate_non_increasing_in_age() {
        let cfg = AnalyticsConfig::default();
        let mut previous = f64::INFINITY;
        for days in 0..400 {
            let rate = growth_rate(123_456, days, &cfg);
            assert!(rate <= previous, "rate increased at day {days}");
            previous = rate;
        }
    }

    #[test]
    fn test_ratios_zero_without_views() {
        assert_eq!(ratio(50, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(25, 100), 0.25);
    }

    #[test]
    fn test_engagement_weights_likes_over_comments() {
        let cfg = AnalyticsConfig::default();
        let likes_only = engagement_rate(0.1, 0.0, &cfg);
        let comments_only = engagement_rate(0.0, 0.1, &cfg);
        assert!(likes_only > comments_only);
    }

    #[test]
    fn test_trending_requires_recency() {
        let cfg = AnalyticsConfig::default();
        let fast = cfg.trending_growth_threshold + 1.0;
        assert!(is_trending(fast, 1, &cfg));
        assert!(!is_trending(fast, cfg.trending_recency_days + 1, &cfg));
        assert!(!is_trending(cfg.trending_growth_threshold, 1, &cfg));
    }

    #[test]
    fn test_new_window() {
        let cfg = AnalyticsConfig::default();
        assert!(is_new(0, &cfg));
        assert!(is_new(2, &cfg));
        assert!(!is_new(3, &cfg));
    }

    #[test]
    fn test_compute_recent_viral_video() {
        let cfg = AnalyticsConfig::default();
        let counters = Counters {
            views: 100_000,
            likes: 5_000,
            comments: 1_000,
        };
        let a = compute(counters, Some(now() - Duration::hours(30)), now(), &cfg);
        assert_eq!(a.days_since_published, 1);
        assert_eq!(a.growth_rate, 100_000.0);
        assert_eq!(a.like_rate, 0.05);
        assert_eq!(a.comment_rate, 0.01);
        assert!(a.is_trending);
        assert!(a.is_new);
    }

    #[test]
    fn test_compute_without_publish_time() {
        let cfg = AnalyticsConfig::default();
        let a = compute(
            Counters {
                views: 1_000_000,
                likes: 0,
                comments: 0,
            },
            None,
            now(),
            &cfg,
        );
        assert_eq!(a.days_since_published, 0);
        assert!(!a.is_new);
        assert!(!a.is_trending);
    }

    #[test]
    fn test_parse_published_at() {
        let parsed = parse_published_at("2025-06-14T12:00:00Z").unwrap();
        assert_eq!(days_since_published(parsed, now()), 1);
        assert!(parse_published_at("yesterday").is_none());
    }
}
