use lodge_http::error::AppError;
use serde_json::json;
use thiserror::Error;

pub const BOOKING_NOT_PERMITTED: &str = "booking not permitted";
pub const ROOM_FULL: &str = "room is full";
pub const SAME_ROOM: &str = "booking already holds this room";

/// Failures surfaced by the booking service
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// A store or collaborator failed; not a domain outcome.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl BookingError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::NotFound(message) => AppError::not_found(message),
            BookingError::Validation(message) => {
                let details = vec![json!({ "field": "roomId", "error": message })];
                AppError::validation(details, message)
            }
            BookingError::Store(e) => AppError::Internal(e),
        }
    }
}
