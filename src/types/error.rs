//! Error types for Ordo
//!
//! Every failure that can reach an HTTP response is represented here.
//! Errors carry a stable machine-readable type identifier alongside the
//! human-readable message, so clients can branch without string matching.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Main error type for Ordo operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed, missing, duplicate or inconsistent payload fields.
    /// Always caller-fixable.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced core file or event key absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// PUT against existing non-empty calendar data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying file-store infrastructure failure. Distinct from
    /// "file doesn't exist", which reads recover from locally.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Write/encode failure on the server's own output.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Problem-style error body returned to clients
#[derive(Debug, Serialize)]
struct ProblemBody<'a> {
    status: u16,
    #[serde(rename = "type")]
    error_type: &'a str,
    error: String,
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable identifier for the error class
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
            Self::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Build the problem-style JSON response for this error
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let body = ProblemBody {
            status: status.as_u16(),
            error_type: self.error_type(),
            error: self.to_string(),
        };
        let json = serde_json::to_vec(&body)
            .unwrap_or_else(|_| br#"{"status":500,"type":"INTERNAL_SERVER_ERROR","error":"encoding failed"}"#.to_vec());

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(Full::new(Bytes::from(json)))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Full::new(Bytes::from(r#"{"error":"Internal error"}"#)))
                    .unwrap()
            })
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::ServiceUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for Ordo operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stable_type_identifiers() {
        assert_eq!(ApiError::Validation("x".into()).error_type(), "VALIDATION_ERROR");
        assert_eq!(ApiError::Conflict("x".into()).error_type(), "CONFLICT");
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).error_type(),
            "SERVICE_UNAVAILABLE"
        );
    }
}
