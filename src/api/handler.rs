use crate::api::AppState;
use crate::cache::ResponseCache;
use crate::error::{AppError, AppResult, LoggedQuery};
use crate::pipeline::sort::sort_videos;
use crate::types::{
    ChannelDetailsResponse, ChannelSearchResponse, ChannelVideosResponse, HealthResponse,
    KeywordSearchResponse, SearchQueryParams, SortKey, SortOrder, SortParams, Video,
};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_CHARS: usize = 100;

const CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

/// Require a non-blank query of at most [`MAX_QUERY_CHARS`] characters and
/// return it trimmed.
pub fn validate_query(raw: Option<&str>) -> AppResult<String> {
    let raw = raw.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("search query is required".to_string()));
    }
    if raw.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "search query is too long (max {MAX_QUERY_CHARS} characters)"
        )));
    }
    Ok(trimmed.to_string())
}

/// Channel ids are opaque but only ever contain URL-safe characters.
pub fn validate_channel_id(id: &str) -> AppResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("invalid channel id".to_string()))
    }
}

/// `None` keeps the platform's order.
pub fn parse_sort(sort: Option<&str>, order: Option<&str>) -> AppResult<Option<(SortKey, SortOrder)>> {
    let order = match order {
        Some(raw) => raw.parse::<SortOrder>().map_err(AppError::Validation)?,
        None => SortOrder::default(),
    };
    sort.map(|raw| raw.parse::<SortKey>().map_err(AppError::Validation))
        .transpose()
        .map(|key| key.map(|key| (key, order)))
}

fn apply_sort(videos: &mut [Video], sorting: Option<(SortKey, SortOrder)>) {
    if let Some((key, order)) = sorting {
        sort_videos(videos, key, order);
    }
}

fn cached_json<T: Serialize>(body: T) -> Response {
    ([(header::CACHE_CONTROL, CACHE_CONTROL)], Json(body)).into_response()
}

/// GET /api/youtube/keyword?q=&sort=&order=
pub async fn keyword_search(
    State(state): State<Arc<AppState>>,
    LoggedQuery(params): LoggedQuery<SearchQueryParams>,
) -> AppResult<Response> {
    let query = validate_query(params.q.as_deref())?;
    let sorting = parse_sort(params.sort.as_deref(), params.order.as_deref())?;

    tracing::info!(query = %query, "keyword search request");

    let key = ResponseCache::cache_key("keyword-search", &query);
    let ttl = Duration::from_secs(state.cache_config.keyword_ttl_secs);
    let mut videos: Vec<Video> = state
        .cache
        .get_or_compute(key, ttl, async {
            state.service.search_videos(&query).await.map_err(AppError::from)
        })
        .await?;

    apply_sort(&mut videos, sorting);
    let count = videos.len();
    Ok(cached_json(KeywordSearchResponse {
        videos,
        query,
        count,
    }))
}

/// GET /api/youtube/search?q=
pub async fn channel_search(
    State(state): State<Arc<AppState>>,
    LoggedQuery(params): LoggedQuery<SearchQueryParams>,
) -> AppResult<Response> {
    let query = validate_query(params.q.as_deref())?;

    tracing::info!(query = %query, "channel search request");

    let key = ResponseCache::cache_key("channel-search", &query);
    let ttl = Duration::from_secs(state.cache_config.channel_search_ttl_secs);
    let channels = state
        .cache
        .get_or_compute(key, ttl, async {
            state.service.search_channels(&query).await.map_err(AppError::from)
        })
        .await?;

    Ok(cached_json(ChannelSearchResponse { channels }))
}

/// GET /api/youtube/channel/{channel_id}?sort=&order=
pub async fn channel_details(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    LoggedQuery(params): LoggedQuery<SortParams>,
) -> AppResult<Response> {
    validate_channel_id(&channel_id)?;
    let sorting = parse_sort(params.sort.as_deref(), params.order.as_deref())?;

    let key = ResponseCache::resource_key("channel", &channel_id);
    let ttl = Duration::from_secs(state.cache_config.channel_ttl_secs);
    let mut details: ChannelDetailsResponse = state
        .cache
        .get_or_compute(key, ttl, async {
            match state.service.channel_details(&channel_id).await {
                Ok(Some((channel, videos))) => Ok(ChannelDetailsResponse { channel, videos }),
                Ok(None) => Err(AppError::NotFound(format!("channel {channel_id} not found"))),
                Err(e) => Err(AppError::from(e)),
            }
        })
        .await?;

    apply_sort(&mut details.videos, sorting);
    Ok(cached_json(details))
}

/// GET /api/youtube/channel/{channel_id}/videos?sort=&order=
pub async fn channel_videos(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    LoggedQuery(params): LoggedQuery<SortParams>,
) -> AppResult<Response> {
    validate_channel_id(&channel_id)?;
    let sorting = parse_sort(params.sort.as_deref(), params.order.as_deref())?;

    let key = ResponseCache::resource_key("channel-videos", &channel_id);
    let ttl = Duration::from_secs(state.cache_config.channel_ttl_secs);
    let mut videos: Vec<Video> = state
        .cache
        .get_or_compute(key, ttl, async {
            state.service.channel_videos(&channel_id).await.map_err(AppError::from)
        })
        .await?;

    apply_sort(&mut videos, sorting);
    let count = videos.len();
    Ok(cached_json(ChannelVideosResponse {
        videos,
        channel_id,
        count,
    }))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        quota_units_spent: state.service.quota_units_spent(),
        cache_entries: state.cache.entry_count(),
    })
}
