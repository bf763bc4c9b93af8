//! Joins reference items from a search or listing call with one batched
//! detail lookup and emits annotated [`Video`] records.

use crate::config::AnalyticsConfig;
use crate::pipeline::analytics::{self, parse_published_at, Counters};
use crate::pipeline::duration::format_duration;
use crate::types::{Video, VideoId};
use crate::youtube::client::VideoPart;
use crate::youtube::error::GatewayError;
use crate::youtube::types::{parse_count, PlaylistItem, SearchResult, Snippet, VideoResource};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// Where per-video statistics and content metadata come from.
pub trait DetailSource {
    /// One batched lookup for `ids`. Ids the platform does not return are
    /// simply absent from the map.
    fn fetch_videos(
        &self,
        ids: &[VideoId],
        parts: &[VideoPart],
    ) -> impl Future<Output = Result<HashMap<VideoId, VideoResource>, GatewayError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Search,
    Listing,
    ById,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Search => "search",
            SourceKind::Listing => "listing",
            SourceKind::ById => "by_id",
        }
    }
}

/// Reference items tagged with the call that produced them. Each variant
/// carries its id in a different place.
#[derive(Debug, Clone)]
pub enum ReferenceBatch {
    /// `search.list`: nested `id.videoId`.
    Search(Vec<SearchResult>),
    /// `playlistItems.list`: `snippet.resourceId.videoId`.
    Listing(Vec<PlaylistItem>),
    /// `videos.list`: flat `id`.
    ById(Vec<VideoResource>),
}

/// A reference item after id resolution.
#[derive(Debug, Clone)]
pub struct VideoRef {
    pub id: Option<VideoId>,
    pub snippet: Snippet,
}

fn non_empty_id(raw: Option<String>) -> Option<VideoId> {
    raw.filter(|id| !id.trim().is_empty()).map(VideoId::new)
}

impl ReferenceBatch {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            ReferenceBatch::Search(_) => SourceKind::Search,
            ReferenceBatch::Listing(_) => SourceKind::Listing,
            ReferenceBatch::ById(_) => SourceKind::ById,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReferenceBatch::Search(items) => items.len(),
            ReferenceBatch::Listing(items) => items.len(),
            ReferenceBatch::ById(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve every item's id into [`VideoId`], keeping response order.
    pub fn into_refs(self) -> Vec<VideoRef> {
        match self {
            ReferenceBatch::Search(items) => items
                .into_iter()
                .map(|item| VideoRef {
                    id: non_empty_id(item.id.video_id),
                    snippet: item.snippet,
                })
                .collect(),
            ReferenceBatch::Listing(items) => items
                .into_iter()
                .map(|item| {
                    let id = item
                        .snippet
                        .resource_id
                        .as_ref()
                        .and_then(|r| r.video_id.clone());
                    VideoRef {
                        id: non_empty_id(id),
                        snippet: item.snippet,
                    }
                })
                .collect(),
            ReferenceBatch::ById(items) => items
                .into_iter()
                .map(|item| VideoRef {
                    id: non_empty_id(Some(item.id)),
                    snippet: item.snippet.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// What to ask the detail source for and how to shape the output.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions<'a> {
    pub parts: &'a [VideoPart],
    /// Forces the owning channel on every record (channel pipelines).
    pub channel_id: Option<&'a str>,
    pub analytics: &'a AnalyticsConfig,
    pub now: DateTime<Utc>,
}

/// Resolve ids, fetch details for the distinct ids in one call, and merge.
///
/// An empty batch returns immediately without calling `source`. Records
/// whose id cannot be resolved are dropped; records without details keep
/// zero counters.
pub async fn aggregate_videos<D: DetailSource + Sync>(
    source: &D,
    batch: ReferenceBatch,
    options: AggregateOptions<'_>,
) -> Result<Vec<Video>, GatewayError> {
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let kind = batch.source_kind();
    let refs = batch.into_refs();

    let mut seen = HashSet::new();
    let ids: Vec<VideoId> = refs
        .iter()
        .filter_map(|r| r.id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if ids.is_empty() {
        tracing::warn!(source = kind.as_str(), items = refs.len(), "no resolvable video ids");
        return Ok(Vec::new());
    }

    let details = source.fetch_videos(&ids, options.parts).await?;

    tracing::debug!(
        source = kind.as_str(),
        references = refs.len(),
        unique_ids = ids.len(),
        details = details.len(),
        "aggregating videos"
    );

    let include_tags = options.parts.contains(&VideoPart::Snippet);
    let videos = refs
        .into_iter()
        .filter_map(|r| {
            let id = r.id?;
            let detail = details.get(&id);
            Some(merge_video(id, r.snippet, detail, include_tags, &options))
        })
        .collect();

    Ok(videos)
}

fn prefer_non_empty(detail: Option<&String>, reference: String) -> String {
    match detail {
        Some(value) if !value.trim().is_empty() => value.clone(),
        _ => reference,
    }
}

/// Merge one reference item with its (optional) detail item.
pub fn merge_video(
    id: VideoId,
    reference: Snippet,
    detail: Option<&VideoResource>,
    include_tags: bool,
    options: &AggregateOptions<'_>,
) -> Video {
    let detail_snippet = detail.and_then(|d| d.snippet.as_ref());
    let statistics = detail.and_then(|d| d.statistics.as_ref());

    let counters = Counters {
        views: parse_count(statistics.and_then(|s| s.view_count.as_ref())),
        likes: parse_count(statistics.and_then(|s| s.like_count.as_ref())),
        comments: parse_count(statistics.and_then(|s| s.comment_count.as_ref())),
    };

    let duration = detail
        .and_then(|d| d.content_details.as_ref())
        .and_then(|c| c.duration.as_deref())
        .map(format_duration)
        .unwrap_or_else(|| "0:00".to_string());

    let thumbnail = reference
        .thumbnails
        .preferred_url()
        .or_else(|| detail_snippet.and_then(|s| s.thumbnails.preferred_url()))
        .unwrap_or_default()
        .to_string();

    // Channel listings fetch details without a snippet, so their timestamp
    // is the playlist's added-at time rather than the publish time.
    let published_at = detail_snippet
        .and_then(|s| s.published_at.clone())
        .or(reference.published_at)
        .unwrap_or_default();

    let channel_id = options
        .channel_id
        .map(str::to_string)
        .or(reference.channel_id)
        .or_else(|| detail_snippet.and_then(|s| s.channel_id.clone()))
        .unwrap_or_default();

    let channel_title = reference
        .channel_title
        .or_else(|| detail_snippet.and_then(|s| s.channel_title.clone()));

    let tags = include_tags.then(|| {
        detail_snippet
            .and_then(|s| s.tags.clone())
            .unwrap_or_default()
    });

    let analytics = analytics::compute(
        counters,
        parse_published_at(&published_at),
        options.now,
        options.analytics,
    );

    Video {
        id,
        channel_id,
        channel_title,
        title: prefer_non_empty(detail_snippet.map(|s| &s.title), reference.title),
        description: prefer_non_empty(
            detail_snippet.map(|s| &s.description),
            reference.description,
        ),
        thumbnail,
        published_at,
        duration,
        view_count: counters.views,
        like_count: counters.likes,
        comment_count: counters.comments,
        tags,
        analytics,
    }
}
