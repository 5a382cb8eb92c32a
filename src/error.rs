use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::db::StoreError;
use crate::services::export::ExportError;
use crate::services::llm_service::LlmError;

/// Error surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Failed to save: {0}")]
    Persistence(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Whether re-issuing the same request is a sensible next step for the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Upstream(_) | ApiError::Schema(_) | ApiError::Persistence(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Schema(_) => "SCHEMA_ERROR",
            ApiError::Persistence(_) => "PERSISTENCE_ERROR",
            ApiError::Export(_) => "EXPORT_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Schema(_) => StatusCode::BAD_GATEWAY,
            ApiError::Persistence(_) | ApiError::Export(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.to_error_payload())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Persistence(other.to_string()),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Malformed(msg) => ApiError::Schema(msg),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::validation("missing destination").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Schema("tiers missing".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound("Itinerary not found".into())).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_error_payload_marks_retryable() {
        let payload = ApiError::Upstream("connection refused".into()).to_error_payload();
        assert_eq!(payload["error"]["code"], "UPSTREAM_ERROR");
        assert_eq!(payload["error"]["retryable"], true);

        let payload = ApiError::validation("bad").to_error_payload();
        assert_eq!(payload["error"]["retryable"], false);
        assert_eq!(payload["error"]["message"], "bad");
    }
}
