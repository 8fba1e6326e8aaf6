//! Authenticated caller extraction.
//!
//! Token verification happens upstream (gateway or auth middleware), which
//! forwards the verified user id in [`USER_ID_HEADER`].

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Id of the authenticated user making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized("authentication required"))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::unauthorized("invalid user identity"))?;

        Ok(CurrentUser(user_id))
    }
}
