use crate::youtube::{GatewayError, GatewayErrorKind};
use axum::extract::rejection::QueryRejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Seconds clients are told to wait after the platform quota runs out.
pub const UPSTREAM_QUOTA_COOLDOWN_SECS: u64 = 300;

/// Throttling details reported alongside a 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub retry_after_secs: u64,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("rate limit exceeded, retry after {}s", .0.retry_after_secs)]
    RateLimited(RateLimitInfo),

    #[error("upstream quota exceeded: {0}")]
    UpstreamQuota(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("upstream rejected request: {0}")]
    UpstreamRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err.kind {
            GatewayErrorKind::QuotaExceeded => AppError::UpstreamQuota(err.message),
            GatewayErrorKind::InvalidRequest => AppError::UpstreamRequest(err.message),
            GatewayErrorKind::InvalidCredential
            | GatewayErrorKind::MissingCredential
            | GatewayErrorKind::Misconfigured => AppError::Configuration(err.message),
            GatewayErrorKind::NotFound => AppError::NotFound(err.message),
            GatewayErrorKind::Upstream | GatewayErrorKind::Transport | GatewayErrorKind::Decode => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

fn rate_limit_headers(info: &RateLimitInfo) -> HeaderMap {
    let reset = chrono::Utc::now() + chrono::Duration::seconds(info.retry_after_secs as i64);
    let pairs = [
        ("retry-after", info.retry_after_secs.to_string()),
        ("x-ratelimit-limit", info.limit.to_string()),
        ("x-ratelimit-remaining", info.remaining.to_string()),
        ("x-ratelimit-reset", reset.to_rfc3339()),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    headers
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited(info) => {
                let body = json!({
                    "error": "Too many requests. Please try again later.",
                    "retryAfter": info.retry_after_secs,
                });
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    rate_limit_headers(info),
                    axum::Json(body),
                )
                    .into_response();
            }
            AppError::UpstreamQuota(msg) => {
                tracing::warn!(error = %msg, "youtube quota exhausted");
                let mut headers = HeaderMap::new();
                headers.insert(
                    axum::http::header::RETRY_AFTER,
                    HeaderValue::from(UPSTREAM_QUOTA_COOLDOWN_SECS),
                );
                let body = json!({
                    "error": "YouTube API quota exceeded. Please try again in 5 minutes.",
                });
                return (StatusCode::TOO_MANY_REQUESTS, headers, axum::Json(body)).into_response();
            }
            AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::UpstreamRequest(msg) => {
                tracing::warn!(error = %msg, "youtube rejected request");
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid search query. Please try different keywords.".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Query-string extractor that logs rejections before turning them into a
/// 400. Drop-in replacement for `axum::extract::Query<T>`.
pub struct LoggedQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for LoggedQuery<T>
where
    axum::extract::Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(LoggedQuery(value)),
            Err(rejection) => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    status = 400,
                    error = %rejection,
                    "query string rejected"
                );
                Err(AppError::Validation(rejection.body_text()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_kinds_map_to_categories() {
        let cases = [
            (GatewayErrorKind::QuotaExceeded, StatusCode::TOO_MANY_REQUESTS),
            (GatewayErrorKind::InvalidRequest, StatusCode::BAD_REQUEST),
            (GatewayErrorKind::InvalidCredential, StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayErrorKind::MissingCredential, StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayErrorKind::Misconfigured, StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayErrorKind::NotFound, StatusCode::NOT_FOUND),
            (GatewayErrorKind::Upstream, StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayErrorKind::Transport, StatusCode::INTERNAL_SERVER_ERROR),
            (GatewayErrorKind::Decode, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            let response = AppError::from(GatewayError::new(kind, "boom")).into_response();
            assert_eq!(response.status(), status, "kind {kind}");
        }
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = AppError::RateLimited(RateLimitInfo {
            retry_after_secs: 42,
            limit: 10,
            remaining: 0,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers["retry-after"], "42");
        assert_eq!(headers["x-ratelimit-limit"], "10");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        let reset = headers["x-ratelimit-reset"].to_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());
    }

    #[test]
    fn test_upstream_quota_sets_cooldown() {
        let response = AppError::UpstreamQuota("quotaExceeded".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "300");
    }

    #[test]
    fn test_transport_errors_are_internal() {
        let err = AppError::from(GatewayError::new(
            GatewayErrorKind::Transport,
            "connect error: secret-host",
        ));
        assert!(matches!(err, AppError::Internal(_)));
    }
}
