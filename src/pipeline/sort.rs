use crate::pipeline::analytics::parse_published_at;
use crate::types::{SortKey, SortOrder, Video};
use std::cmp::Ordering;

/// Stable in-place sort of a result set by one of the exposed metrics.
pub fn sort_videos(videos: &mut [Video], key: SortKey, order: SortOrder) {
    videos.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare(a: &Video, b: &Video, key: SortKey) -> Ordering {
    match key {
        SortKey::Views => a.view_count.cmp(&b.view_count),
        SortKey::Likes => a.like_count.cmp(&b.like_count),
        SortKey::Comments => a.comment_count.cmp(&b.comment_count),
        SortKey::Growth => a.analytics.growth_rate.total_cmp(&b.analytics.growth_rate),
        SortKey::Date => {
            parse_published_at(&a.published_at).cmp(&parse_published_at(&b.published_at))
        }
    }
}
