use crate::youtube::types::ApiErrorBody;
use reqwest::StatusCode;

/// Where a gateway call failed. Assigned once, at the point of failure,
/// so callers never have to inspect message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// The platform reports the project's call budget is spent.
    QuotaExceeded,
    /// The platform rejected the request parameters (malformed query, bad id).
    InvalidRequest,
    /// The configured credential was refused.
    InvalidCredential,
    /// No credential was configured at construction time.
    MissingCredential,
    /// Local client settings are unusable (bad base URL, HTTP client setup).
    Misconfigured,
    NotFound,
    /// Any other non-success status.
    Upstream,
    /// The call never produced a response (DNS, TLS, timeout, ...).
    Transport,
    /// A success response whose body did not match the expected shape.
    Decode,
}

impl GatewayErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayErrorKind::QuotaExceeded => "quota_exceeded",
            GatewayErrorKind::InvalidRequest => "invalid_request",
            GatewayErrorKind::InvalidCredential => "invalid_credential",
            GatewayErrorKind::MissingCredential => "missing_credential",
            GatewayErrorKind::Misconfigured => "misconfigured",
            GatewayErrorKind::NotFound => "not_found",
            GatewayErrorKind::Upstream => "upstream",
            GatewayErrorKind::Transport => "transport",
            GatewayErrorKind::Decode => "decode",
        }
    }
}

impl std::fmt::Display for GatewayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a non-success response from its status and raw body.
    ///
    /// The structured `error.errors[].reason` codes win over the status code;
    /// when the body is not the platform's error envelope the message falls
    /// back to `API Error: <status>`.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();

        let message = parsed
            .as_ref()
            .and_then(|b| b.error.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));

        let reasons: Vec<&str> = parsed
            .as_ref()
            .map(|b| {
                b.error
                    .errors
                    .iter()
                    .filter_map(|e| e.reason.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        let has_reason = |candidates: &[&str]| reasons.iter().any(|r| candidates.contains(r));

        let kind = if has_reason(&[
            "quotaExceeded",
            "dailyLimitExceeded",
            "rateLimitExceeded",
            "userRateLimitExceeded",
        ]) {
            GatewayErrorKind::QuotaExceeded
        } else if has_reason(&[
            "keyInvalid",
            "keyExpired",
            "accessNotConfigured",
            "ipRefererBlocked",
        ]) {
            GatewayErrorKind::InvalidCredential
        } else {
            match status {
                StatusCode::BAD_REQUEST => GatewayErrorKind::InvalidRequest,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GatewayErrorKind::InvalidCredential
                }
                StatusCode::NOT_FOUND => GatewayErrorKind::NotFound,
                StatusCode::TOO_MANY_REQUESTS => GatewayErrorKind::QuotaExceeded,
                _ => GatewayErrorKind::Upstream,
            }
        };

        Self { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_reason_wins_over_forbidden_status() {
        let body = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota.","errors":[{"reason":"quotaExceeded","domain":"youtube.quota"}]}}"#;
        let err = GatewayError::from_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, GatewayErrorKind::QuotaExceeded);
        assert!(err.message.contains("exceeded your quota"));
    }

    #[test]
    fn test_invalid_key_is_credential_error_even_on_400() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","errors":[{"reason":"keyInvalid"}]}}"#;
        let err = GatewayError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, GatewayErrorKind::InvalidCredential);
    }

    #[test]
    fn test_plain_bad_request_is_invalid_request() {
        let body = r#"{"error":{"code":400,"message":"Invalid value for q","errors":[{"reason":"invalidParameter"}]}}"#;
        let err = GatewayError::from_response(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, GatewayErrorKind::InvalidRequest);
        assert_eq!(err.message, "Invalid value for q");
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status_message() {
        let err = GatewayError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.kind, GatewayErrorKind::Upstream);
        assert_eq!(err.message, "API Error: 502");
    }

    #[test]
    fn test_display_includes_kind() {
        let err = GatewayError::new(GatewayErrorKind::Transport, "connection reset");
        assert_eq!(err.to_string(), "transport: connection reset");
    }
}
