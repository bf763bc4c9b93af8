//! Authenticated access to the video platform's search and list endpoints.

use crate::config::YouTubeConfig;
use crate::pipeline::aggregator::DetailSource;
use crate::types::VideoId;
use crate::youtube::error::{GatewayError, GatewayErrorKind};
use crate::youtube::types::{
    ChannelResource, ListResponse, PlaylistItem, SearchResult, VideoResource,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// The endpoints this service calls, with their estimated quota charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Videos,
    Channels,
    PlaylistItems,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Search => "search",
            Endpoint::Videos => "videos",
            Endpoint::Channels => "channels",
            Endpoint::PlaylistItems => "playlistItems",
        }
    }

    /// Quota units one call costs. Search is the expensive call; every
    /// list-by-id or listing call costs a single unit.
    pub fn quota_cost(&self) -> u64 {
        match self {
            Endpoint::Search => 100,
            Endpoint::Videos | Endpoint::Channels | Endpoint::PlaylistItems => 1,
        }
    }
}

/// Resource type filter for `search.list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Video,
    Channel,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Video => "video",
            SearchKind::Channel => "channel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Date,
    ViewCount,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Date => "date",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

/// Parameters of one `search.list` call. Either `query` or `channel_id`
/// (or both) narrow the result set.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub kind: SearchKind,
    pub query: Option<&'a str>,
    pub channel_id: Option<&'a str>,
    pub max_results: u32,
    pub order: Option<SearchOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPart {
    Snippet,
    Statistics,
    ContentDetails,
}

impl VideoPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoPart::Snippet => "snippet",
            VideoPart::Statistics => "statistics",
            VideoPart::ContentDetails => "contentDetails",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPart {
    Snippet,
    Statistics,
    ContentDetails,
}

impl ChannelPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelPart::Snippet => "snippet",
            ChannelPart::Statistics => "statistics",
            ChannelPart::ContentDetails => "contentDetails",
        }
    }
}

fn join_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().collect::<Vec<_>>().join(",")
}

/// Client for the YouTube Data API v3, authenticated with a server API key.
///
/// The key is attached to every request as the `key` query parameter and is
/// never included in log output. Calls are not retried: a failed call fails
/// the whole pipeline run.
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    quota_spent: AtomicU64,
}

impl YouTubeClient {
    /// Build the client, failing fast when no key is configured or the base
    /// URL is unusable.
    pub fn new(config: &YouTubeConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(GatewayError::new(
                GatewayErrorKind::MissingCredential,
                "YouTube API key is not configured",
            ));
        }

        let base = url::Url::parse(&config.base_url).map_err(|e| {
            GatewayError::new(
                GatewayErrorKind::Misconfigured,
                format!("invalid base URL: {e}"),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::new(
                    GatewayErrorKind::Misconfigured,
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        tracing::info!(base_url = %base, "youtube client initialized");

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            quota_spent: AtomicU64::new(0),
        })
    }

    /// Estimated quota units charged since process start.
    pub fn quota_units_spent(&self) -> u64 {
        self.quota_spent.load(Ordering::Relaxed)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());

        tracing::debug!(endpoint = endpoint.path(), ?params, "calling youtube api");

        // Charged on attempt: the platform bills rejected calls too.
        self.quota_spent
            .fetch_add(endpoint.quota_cost(), Ordering::Relaxed);

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the full URL, key included.
                let e = e.without_url();
                tracing::warn!(endpoint = endpoint.path(), error = %e, "youtube request failed");
                GatewayError::new(GatewayErrorKind::Transport, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = GatewayError::from_response(status, &body);
            tracing::warn!(
                endpoint = endpoint.path(),
                status = status.as_u16(),
                kind = %err.kind,
                message = %err.message,
                "youtube api returned an error"
            );
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            GatewayError::new(
                GatewayErrorKind::Decode,
                format!("parse {} response: {}", endpoint.path(), e.without_url()),
            )
        })
    }

    /// `search.list` with `part=snippet`. Returns lightweight reference items.
    pub async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<SearchResult>, GatewayError> {
        let max_results = request.max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", request.kind.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(q) = request.query {
            params.push(("q", q));
        }
        if let Some(channel_id) = request.channel_id {
            params.push(("channelId", channel_id));
        }
        if let Some(order) = request.order {
            params.push(("order", order.as_str()));
        }

        let response: ListResponse<SearchResult> = self.get(Endpoint::Search, &params).await?;
        Ok(response.items)
    }

    /// `videos.list` for a batch of ids in one call, keyed by video id.
    pub async fn video_details(
        &self,
        ids: &[VideoId],
        parts: &[VideoPart],
    ) -> Result<HashMap<VideoId, VideoResource>, GatewayError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let id_list = join_parts(ids.iter().map(VideoId::as_str));
        let part = join_parts(parts.iter().map(VideoPart::as_str));

        let response: ListResponse<VideoResource> = self
            .get(Endpoint::Videos, &[("part", part.as_str()), ("id", id_list.as_str())])
            .await?;

        Ok(response
            .items
            .into_iter()
            .map(|item| (VideoId::new(item.id.clone()), item))
            .collect())
    }

    /// `channels.list` for a batch of ids, in the platform's response order.
    pub async fn channels(
        &self,
        ids: &[&str],
        parts: &[ChannelPart],
    ) -> Result<Vec<ChannelResource>, GatewayError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = ids.join(",");
        let part = join_parts(parts.iter().map(ChannelPart::as_str));

        let response: ListResponse<ChannelResource> = self
            .get(Endpoint::Channels, &[("part", part.as_str()), ("id", id_list.as_str())])
            .await?;
        Ok(response.items)
    }

    /// First page of `playlistItems.list` with `part=snippet`.
    pub async fn playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, GatewayError> {
        let max_results = max_results.to_string();
        let response: ListResponse<PlaylistItem> = self
            .get(
                Endpoint::PlaylistItems,
                &[
                    ("part", "snippet"),
                    ("playlistId", playlist_id),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;
        Ok(response.items)
    }
}

impl DetailSource for YouTubeClient {
    fn fetch_videos(
        &self,
        ids: &[VideoId],
        parts: &[VideoPart],
    ) -> impl Future<Output = Result<HashMap<VideoId, VideoResource>, GatewayError>> + Send {
        self.video_details(ids, parts)
    }
}
