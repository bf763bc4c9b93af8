//! Per-client sliding-window request limiter.
//!
//! Each client key keeps the instants of its admitted requests. Every check
//! first drops instants older than the window, then admits the request only
//! if fewer than `max_requests` remain. Client keys are never evicted.

pub mod middleware;

use crate::config::RateLimitConfig;
use crate::error::RateLimitInfo;
use axum::http::HeaderMap;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Bucket shared by every caller whose address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

fn prune(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = entries.front() {
        if now.saturating_duration_since(*oldest) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    fn with_entries<R>(
        &self,
        key: &str,
        now: Instant,
        f: impl FnOnce(&mut VecDeque<Instant>) -> R,
    ) -> R {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        let entries = history.entry(key.to_string()).or_default();
        prune(entries, now, self.window);
        f(entries)
    }

    fn reset_secs(&self, entries: &VecDeque<Instant>, now: Instant) -> u64 {
        let Some(oldest) = entries.front() else {
            return 0;
        };
        let remaining = self
            .window
            .saturating_sub(now.saturating_duration_since(*oldest));
        // Round up so a client that waits the advertised time is admitted.
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        secs.max(1)
    }

    /// Admit and record one request, or report when to retry.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitInfo> {
        self.with_entries(key, now, |entries| {
            if entries.len() >= self.max_requests as usize {
                return Err(RateLimitInfo {
                    retry_after_secs: self.reset_secs(entries, now),
                    limit: self.max_requests,
                    remaining: 0,
                });
            }
            entries.push_back(now);
            Ok(())
        })
    }

    pub fn check(&self, key: &str) -> Result<(), RateLimitInfo> {
        self.check_at(key, Instant::now())
    }

    pub fn check_limit(&self, key: &str) -> bool {
        self.check(key).is_ok()
    }

    pub fn remaining_requests_at(&self, key: &str, now: Instant) -> u32 {
        self.with_entries(key, now, |entries| {
            self.max_requests.saturating_sub(entries.len() as u32)
        })
    }

    pub fn remaining_requests(&self, key: &str) -> u32 {
        self.remaining_requests_at(key, Instant::now())
    }

    /// Seconds until the oldest recorded request leaves the window; 0 when
    /// the client has no requests in the window.
    pub fn reset_time_secs_at(&self, key: &str, now: Instant) -> u64 {
        self.with_entries(key, now, |entries| self.reset_secs(entries, now))
    }

    pub fn reset_time_secs(&self, key: &str) -> u64 {
        self.reset_time_secs_at(key, Instant::now())
    }
}

/// First `X-Forwarded-For` hop, else the peer address, else [`UNKNOWN_CLIENT`].
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn test_denies_request_over_ceiling() {
        let rl = limiter(10, 60);
        let now = Instant::now();
        for i in 0..10 {
            assert!(rl.check_at("ip", now + Duration::from_secs(i)).is_ok());
        }
        let denied = rl.check_at("ip", now + Duration::from_secs(10)).unwrap_err();
        assert_eq!(denied.limit, 10);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs, 50);
    }

    #[test]
    fn test_allows_again_after_oldest_ages_out() {
        let rl = limiter(2, 60);
        let start = Instant::now();
        assert!(rl.check_at("ip", start).is_ok());
        assert!(rl.check_at("ip", start + Duration::from_secs(30)).is_ok());
        assert!(rl.check_at("ip", start + Duration::from_secs(60)).is_err());
        assert!(rl
            .check_at("ip", start + Duration::from_secs(60) + Duration::from_millis(1))
            .is_ok());
    }

    #[test]
    fn test_denied_requests_are_not_recorded() {
        let rl = limiter(1, 60);
        let start = Instant::now();
        assert!(rl.check_at("ip", start).is_ok());
        for s in 1..5 {
            assert!(rl.check_at("ip", start + Duration::from_secs(s)).is_err());
        }
        assert!(rl.check_at("ip", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn test_clients_are_independent() {
        let rl = limiter(1, 60);
        assert!(rl.check_limit("a"));
        assert!(!rl.check_limit("a"));
        assert!(rl.check_limit("b"));
    }

    #[test]
    fn test_remaining_and_reset() {
        let rl = limiter(3, 60);
        let start = Instant::now();
        assert_eq!(rl.remaining_requests_at("ip", start), 3);
        assert_eq!(rl.reset_time_secs_at("ip", start), 0);

        rl.check_at("ip", start).unwrap();
        rl.check_at("ip", start).unwrap();
        let later = start + Duration::from_millis(10_500);
        assert_eq!(rl.remaining_requests_at("ip", later), 1);
        assert_eq!(rl.reset_time_secs_at("ip", later), 50);
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let rl = limiter(1, 60);
        let start = Instant::now();
        rl.check_at("ip", start).unwrap();
        let info = rl
            .check_at("ip", start + Duration::from_secs(60))
            .unwrap_err();
        assert_eq!(info.retry_after_secs, 1);
    }

    #[test]
    fn test_client_key_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_key_falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.1:443".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.1");
        assert_eq!(client_key(&headers, None), UNKNOWN_CLIENT);

        let mut blank = HeaderMap::new();
        blank.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_key(&blank, None), UNKNOWN_CLIENT);
    }
}
