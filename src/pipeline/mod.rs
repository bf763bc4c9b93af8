pub mod aggregator;
pub mod analytics;
pub mod duration;
pub mod sort;

use crate::config::{AnalyticsConfig, YouTubeConfig};
use crate::pipeline::aggregator::{aggregate_videos, AggregateOptions, ReferenceBatch};
use crate::types::{Channel, Video};
use crate::youtube::client::{ChannelPart, SearchKind, SearchOrder, SearchRequest, VideoPart};
use crate::youtube::types::{parse_count, ChannelResource};
use crate::youtube::{GatewayError, YouTubeClient};
use chrono::Utc;
use std::sync::Arc;

const KEYWORD_PARTS: [VideoPart; 3] = [
    VideoPart::Snippet,
    VideoPart::Statistics,
    VideoPart::ContentDetails,
];
const CHANNEL_VIDEO_PARTS: [VideoPart; 2] = [VideoPart::Statistics, VideoPart::ContentDetails];

/// Sequences gateway calls, aggregation and analytics for each request kind.
///
/// Every method is one uncached pipeline run; callers put the result set in
/// the response cache.
pub struct VideoService {
    client: Arc<YouTubeClient>,
    youtube: YouTubeConfig,
    analytics: AnalyticsConfig,
}

impl VideoService {
    pub fn new(client: Arc<YouTubeClient>, youtube: YouTubeConfig, analytics: AnalyticsConfig) -> Self {
        Self {
            client,
            youtube,
            analytics,
        }
    }

    pub fn quota_units_spent(&self) -> u64 {
        self.client.quota_units_spent()
    }

    fn options<'a>(&'a self, parts: &'a [VideoPart], channel_id: Option<&'a str>) -> AggregateOptions<'a> {
        AggregateOptions {
            parts,
            channel_id,
            analytics: &self.analytics,
            now: Utc::now(),
        }
    }

    /// Most-viewed videos matching `query`, tags included.
    pub async fn search_videos(&self, query: &str) -> Result<Vec<Video>, GatewayError> {
        let start = self.quota_units_spent();

        let results = self
            .client
            .search(&SearchRequest {
                kind: SearchKind::Video,
                query: Some(query),
                channel_id: None,
                max_results: self.youtube.keyword_max_results,
                order: Some(SearchOrder::ViewCount),
            })
            .await?;

        let videos = aggregate_videos(
            self.client.as_ref(),
            ReferenceBatch::Search(results),
            self.options(&KEYWORD_PARTS, None),
        )
        .await?;

        tracing::info!(
            query = %query,
            count = videos.len(),
            quota_units = self.quota_units_spent().saturating_sub(start),
            "keyword search completed"
        );
        Ok(videos)
    }

    /// Channels matching `query`, with statistics.
    pub async fn search_channels(&self, query: &str) -> Result<Vec<Channel>, GatewayError> {
        let start = self.quota_units_spent();

        let results = self
            .client
            .search(&SearchRequest {
                kind: SearchKind::Channel,
                query: Some(query),
                channel_id: None,
                max_results: self.youtube.channel_search_max_results,
                order: None,
            })
            .await?;

        let ids: Vec<&str> = results
            .iter()
            .filter_map(|r| r.id.channel_id.as_deref().or(r.snippet.channel_id.as_deref()))
            .filter(|id| !id.is_empty())
            .collect();

        let channels = self
            .client
            .channels(&ids, &[ChannelPart::Snippet, ChannelPart::Statistics])
            .await?
            .into_iter()
            .map(to_channel)
            .collect::<Vec<_>>();

        tracing::info!(
            query = %query,
            count = channels.len(),
            quota_units = self.quota_units_spent().saturating_sub(start),
            "channel search completed"
        );
        Ok(channels)
    }

    /// Recent uploads of `channel_id`.
    pub async fn channel_videos(&self, channel_id: &str) -> Result<Vec<Video>, GatewayError> {
        let start = self.quota_units_spent();

        let channels = self
            .client
            .channels(&[channel_id], &[ChannelPart::ContentDetails])
            .await?;
        let uploads = channels.first().and_then(ChannelResource::uploads_playlist);
        let videos = self.videos_for_channel(channel_id, uploads).await?;

        tracing::info!(
            channel_id = %channel_id,
            count = videos.len(),
            quota_units = self.quota_units_spent().saturating_sub(start),
            "channel videos completed"
        );
        Ok(videos)
    }

    /// The channel snapshot and its recent uploads, or `None` if the platform
    /// does not know the channel.
    pub async fn channel_details(
        &self,
        channel_id: &str,
    ) -> Result<Option<(Channel, Vec<Video>)>, GatewayError> {
        let start = self.quota_units_spent();

        let Some(resource) = self
            .client
            .channels(
                &[channel_id],
                &[
                    ChannelPart::Snippet,
                    ChannelPart::Statistics,
                    ChannelPart::ContentDetails,
                ],
            )
            .await?
            .into_iter()
            .next()
        else {
            tracing::info!(channel_id = %channel_id, "channel not found");
            return Ok(None);
        };

        let videos = self
            .videos_for_channel(channel_id, resource.uploads_playlist())
            .await?;
        let channel = to_channel(resource);

        tracing::info!(
            channel_id = %channel_id,
            count = videos.len(),
            quota_units = self.quota_units_spent().saturating_sub(start),
            "channel details completed"
        );
        Ok(Some((channel, videos)))
    }

    /// Uploads playlist first; a missing or empty playlist falls back to a
    /// date-ordered search scoped to the channel.
    async fn videos_for_channel(
        &self,
        channel_id: &str,
        uploads: Option<&str>,
    ) -> Result<Vec<Video>, GatewayError> {
        let max_results = self.youtube.channel_max_results;

        let listing = match uploads {
            Some(playlist_id) => self.client.playlist_items(playlist_id, max_results).await?,
            None => Vec::new(),
        };

        let batch = if listing.is_empty() {
            tracing::debug!(channel_id = %channel_id, "no uploads listing, falling back to search");
            let results = self
                .client
                .search(&SearchRequest {
                    kind: SearchKind::Video,
                    query: None,
                    channel_id: Some(channel_id),
                    max_results,
                    order: Some(SearchOrder::Date),
                })
                .await?;
            ReferenceBatch::Search(results)
        } else {
            ReferenceBatch::Listing(listing)
        };

        aggregate_videos(
            self.client.as_ref(),
            batch,
            self.options(&CHANNEL_VIDEO_PARTS, Some(channel_id)),
        )
        .await
    }
}

/// Map a `channels.list` resource to the domain snapshot.
pub fn to_channel(resource: ChannelResource) -> Channel {
    let snippet = resource.snippet.unwrap_or_default();
    let statistics = resource.statistics.unwrap_or_default();

    Channel {
        thumbnail: snippet
            .thumbnails
            .preferred_url()
            .unwrap_or_default()
            .to_string(),
        id: resource.id,
        title: snippet.title,
        description: snippet.description,
        custom_url: snippet.custom_url.filter(|handle| !handle.is_empty()),
        subscriber_count: parse_count(statistics.subscriber_count.as_ref()),
        video_count: parse_count(statistics.video_count.as_ref()),
        view_count: parse_count(statistics.view_count.as_ref()),
        published_at: snippet.published_at.unwrap_or_default(),
    }
}
