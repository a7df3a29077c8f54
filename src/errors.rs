use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

use crate::services::cache_service::CacheError;

/// Reason phrase used when a status code has no canonical one.
pub const UNKNOWN_STATUS_TEXT: &str = "Unknown Status";

/// Main error type for the user lookup service
#[derive(Debug)]
pub enum AppError {
    // Remote user service answered with something other than 200
    RemoteRequest { status: u16, status_text: String },

    // Network and HTTP client errors
    NetworkTimeout,
    NetworkConnection(String),
    HttpClient(String),

    // Serialization and parsing errors
    JsonParsing(String),
    JsonSerialization(String),

    // Business logic errors
    InvalidUserId(String),

    // Cache store errors
    Cache(CacheError),

    // Configuration and setup errors
    ConfigurationError(String),
    InvalidConfiguration { key: String, value: String, reason: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::RemoteRequest { status, status_text } => write!(
                f,
                "User Service request failed with error type: {} and message: {}",
                status, status_text
            ),

            AppError::NetworkTimeout => write!(f, "Network request timed out"),
            AppError::NetworkConnection(msg) => write!(f, "Network connection error: {}", msg),
            AppError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),

            AppError::JsonParsing(msg) => write!(f, "JSON parsing error: {}", msg),
            AppError::JsonSerialization(msg) => write!(f, "JSON serialization error: {}", msg),

            AppError::InvalidUserId(id) => write!(f, "Invalid user ID: '{}'", id),

            AppError::Cache(err) => write!(f, "Cache error: {}", err),

            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InvalidConfiguration { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::RemoteRequest { status: 404, .. } => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::RemoteRequest { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AppError::NetworkTimeout => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
            AppError::NetworkConnection(_) => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            AppError::InvalidUserId(_) => (StatusCode::BAD_REQUEST, "invalid_user_id"),

            // All other errors are treated as internal server errors
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::NetworkTimeout
        } else if err.is_connect() {
            AppError::NetworkConnection(err.to_string())
        } else if err.is_decode() {
            AppError::JsonParsing(err.to_string())
        } else {
            AppError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::JsonParsing(err.to_string())
        } else {
            AppError::JsonSerialization(err.to_string())
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err)
    }
}

impl AppError {
    /// Builds the error for a non-success response, looking up the reason
    /// phrase from the status code.
    pub fn remote_request(status: u16) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or(UNKNOWN_STATUS_TEXT);

        AppError::RemoteRequest {
            status,
            status_text: status_text.to_string(),
        }
    }

    /// Status code of a failed remote request, if this is one.
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            AppError::RemoteRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn invalid_user_id(user_id: impl Into<String>) -> Self {
        AppError::InvalidUserId(user_id.into())
    }

    pub fn invalid_configuration(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AppError::InvalidConfiguration {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_request_message_is_literal() {
        let error = AppError::remote_request(403);
        assert_eq!(
            error.to_string(),
            "User Service request failed with error type: 403 and message: Forbidden"
        );
    }

    #[test]
    fn test_remote_request_looks_up_reason_phrase() {
        assert_eq!(
            AppError::remote_request(404).to_string(),
            "User Service request failed with error type: 404 and message: Not Found"
        );
        assert_eq!(
            AppError::remote_request(503).to_string(),
            "User Service request failed with error type: 503 and message: Service Unavailable"
        );
    }

    #[test]
    fn test_unassigned_status_uses_fallback_text() {
        assert_eq!(
            AppError::remote_request(599).to_string(),
            "User Service request failed with error type: 599 and message: Unknown Status"
        );
    }

    #[test]
    fn test_remote_status() {
        assert_eq!(AppError::remote_request(500).remote_status(), Some(500));
        assert_eq!(AppError::NetworkTimeout.remote_status(), None);
    }

    #[test]
    fn test_response_status_mapping() {
        let cases = [
            (AppError::remote_request(404), StatusCode::NOT_FOUND),
            (AppError::remote_request(403), StatusCode::BAD_GATEWAY),
            (AppError::NetworkTimeout, StatusCode::GATEWAY_TIMEOUT),
            (AppError::invalid_user_id(""), StatusCode::BAD_REQUEST),
            (AppError::Cache(CacheError::CacheDisabled), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_redis_errors_arrive_through_cache_error() {
        let redis_err = redis::RedisError::from((redis::ErrorKind::ResponseError, "WRONGTYPE"));
        let error = AppError::from(CacheError::from(redis_err));
        assert!(matches!(error, AppError::Cache(CacheError::OperationError(_))));
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(AppError::from(err), AppError::JsonParsing(_)));
    }
}
