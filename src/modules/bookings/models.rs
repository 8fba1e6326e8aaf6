use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type UserId = i64;
pub type RoomId = i64;
pub type HotelId = i64;
pub type BookingId = i64;

/// A hotel room. Read-only from the bookings module's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub hotel_id: HotelId,
    pub name: String,
    /// Maximum number of bookings referencing this room
    pub capacity: u32,
}

/// A user's booking of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A booking joined with the room it references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithRoom {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "Room")]
    pub room: Room,
}

/// Data needed to create a booking; id and timestamps are assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Update-or-create payload keyed by booking id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertBooking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// Request body for `POST /` and `PUT /{bookingId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: Option<RoomId>,
}

/// Response body of `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSummary {
    pub id: BookingId,
    #[serde(rename = "Room")]
    pub room: Room,
}

impl From<BookingWithRoom> for BookingSummary {
    fn from(value: BookingWithRoom) -> Self {
        Self {
            id: value.booking.id,
            room: value.room,
        }
    }
}
