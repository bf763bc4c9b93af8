use crate::error::AppError;
use crate::ratelimit::{client_key, RateLimiter};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Gate every API request through the limiter before any handler runs.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    match limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(info) => {
            tracing::warn!(
                client = %key,
                retry_after = info.retry_after_secs,
                path = %request.uri().path(),
                "rate limit exceeded"
            );
            AppError::RateLimited(info).into_response()
        }
    }
}
