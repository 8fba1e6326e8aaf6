//! Error handling for the LODGE HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::request_id::current_request_id;

/// Envelope wrapping every error body: `{"error": {...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Standard error payload for all HTTP errors.
///
/// `trace_id` is the request's `x-request-id` when the router carries the
/// request id layers, otherwise a fresh UUID.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        code: String,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: "unauthorized".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let trace_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        let (code, message, details) = match self {
            AppError::Validation {
                details,
                code,
                message,
            } => (code, message, details),
            AppError::NotFound { message, code }
            | AppError::Unauthorized { message, code }
            | AppError::BadRequest { message, code } => (code, message, Vec::new()),
            AppError::Internal(e) => {
                tracing::error!(trace_id = %trace_id, error = ?e, "internal error");
                ("internal_error".to_string(), e.to_string(), Vec::new())
            }
        };

        if status.is_server_error() {
            tracing::error!(
                trace_id = %trace_id,
                error_code = %code,
                status_code = %status.as_u16(),
                "request error"
            );
        } else {
            tracing::warn!(
                trace_id = %trace_id,
                error_code = %code,
                status_code = %status.as_u16(),
                message = %message,
                "request rejected"
            );
        }

        // Internal details stay in the logs for release builds.
        let message = if cfg!(not(debug_assertions)) && status.is_server_error() {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                code,
                message,
                details,
                trace_id,
                timestamp,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn envelope(error: AppError) -> (StatusCode, ErrorEnvelope) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn validation_constructor_sets_code() {
        let details = vec![serde_json::json!({"field": "roomId", "error": "room is full"})];
        let error = AppError::validation(details.clone(), "room is full");

        match error {
            AppError::Validation {
                details: d,
                code,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(code, "validation_error");
                assert_eq!(message, "room is full");
            }
            _ => panic!("expected Validation error"),
        }
    }

    #[tokio::test]
    async fn not_found_renders_envelope() {
        let (status, body) = envelope(AppError::not_found("booking not found")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "not_found");
        assert_eq!(body.error.message, "booking not found");
        assert!(body.error.details.is_empty());
        assert!(Uuid::parse_str(&body.error.trace_id).is_ok());
        assert!(OffsetDateTime::parse(&body.error.timestamp, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn validation_keeps_details() {
        let details = vec![serde_json::json!({"reason": "same_room"})];
        let (status, body) = envelope(AppError::validation(details.clone(), "nope")).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.details, details);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            AppError::bad_request("missing").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::unauthorized("who").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("store unavailable")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
