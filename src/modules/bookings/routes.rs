//! HTTP handlers for the bookings module, mounted at `/api/bookings`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use lodge_http::{auth::CurrentUser, error::AppError};

use super::models::{Booking, BookingId, BookingRequest, BookingSummary, RoomId};
use super::service::BookingService;

pub fn router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route(
            "/",
            get(get_booking)
                .post(create_booking)
                .put(missing_booking_id),
        )
        .route("/{booking_id}", put(update_booking))
        .with_state(service)
}

fn room_id_from(
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<RoomId, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    request
        .room_id
        .ok_or_else(|| AppError::bad_request("Room id is required"))
}

async fn get_booking(
    State(service): State<Arc<BookingService>>,
    user: CurrentUser,
) -> Result<Json<BookingSummary>, AppError> {
    let booking = service.get_booking(user.id()).await?;
    Ok(Json(booking.into()))
}

async fn create_booking(
    State(service): State<Arc<BookingService>>,
    user: CurrentUser,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let room_id = room_id_from(payload)?;
    let booking = service.book_room_by_id(user.id(), room_id).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn update_booking(
    State(service): State<Arc<BookingService>>,
    user: CurrentUser,
    booking_id: Result<Path<BookingId>, PathRejection>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let room_id = room_id_from(payload)?;
    let Path(booking_id) =
        booking_id.map_err(|_| AppError::bad_request("Booking id is required"))?;

    // The booking is resolved from the caller; the path id only has to be present.
    tracing::debug!(
        booking_id,
        user_id = user.id(),
        room_id,
        "booking update requested"
    );

    let booking = service.update_booking(user.id(), room_id).await?;
    Ok(Json(booking))
}

async fn missing_booking_id(_user: CurrentUser) -> AppError {
    AppError::bad_request("Booking id is required")
}
