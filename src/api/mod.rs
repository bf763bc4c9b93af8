pub mod handler;

use crate::cache::ResponseCache;
use crate::config::{AppConfig, CacheConfig};
use crate::pipeline::VideoService;
use crate::ratelimit::middleware::rate_limit;
use crate::ratelimit::RateLimiter;
use crate::youtube::{GatewayError, YouTubeClient};
use axum::http::{header, Method};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the API handlers.
pub struct AppState {
    pub service: VideoService,
    pub cache: ResponseCache,
    pub cache_config: CacheConfig,
}

impl AppState {
    /// Build every component from configuration. Fails when the platform
    /// client cannot be constructed (no API key, bad base URL).
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let client = Arc::new(YouTubeClient::new(&config.youtube)?);
        Ok(Self {
            service: VideoService::new(client, config.youtube.clone(), config.analytics.clone()),
            cache: ResponseCache::new(config.cache.max_capacity),
            cache_config: config.cache.clone(),
        })
    }
}

/// Assemble the HTTP surface. API routes sit behind the rate limiter;
/// `/health` does not. `OPTIONS` requests are answered by the CORS layer
/// before routing, so preflights never count against a client.
pub fn router(state: Arc<AppState>, limiter: Arc<RateLimiter>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/api/youtube/keyword", get(handler::keyword_search))
        .route("/api/youtube/search", get(handler::channel_search))
        .route("/api/youtube/channel/{channel_id}", get(handler::channel_details))
        .route("/api/youtube/channel/{channel_id}/videos", get(handler::channel_videos))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/health", get(handler::health))
        .merge(api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
