//! Booking workflows: entitlement check, capacity check, then write.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::entitlement::{Entitlement, EntitlementCheck};
use super::error::{BookingError, BOOKING_NOT_PERMITTED, ROOM_FULL, SAME_ROOM};
use super::models::{Booking, BookingWithRoom, NewBooking, Room, RoomId, UpsertBooking, UserId};
use super::store::{BookingStore, RoomStore};

pub type BookingResult<T> = Result<T, BookingError>;

pub struct BookingService {
    rooms: Arc<dyn RoomStore>,
    bookings: Arc<dyn BookingStore>,
    entitlements: Arc<dyn EntitlementCheck>,
    /// Held from capacity check to write when `serialize_writes` is on.
    write_gate: Mutex<()>,
    serialize_writes: bool,
}

impl BookingService {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        bookings: Arc<dyn BookingStore>,
        entitlements: Arc<dyn EntitlementCheck>,
    ) -> Self {
        Self {
            rooms,
            bookings,
            entitlements,
            write_gate: Mutex::new(()),
            serialize_writes: true,
        }
    }

    /// Turn the write gate on or off. Without it two concurrent requests can
    /// both pass the capacity check for a room's last slot.
    pub fn serialize_writes(mut self, enabled: bool) -> Self {
        self.serialize_writes = enabled;
        self
    }

    /// The user's booking together with its room
    pub async fn get_booking(&self, user_id: UserId) -> BookingResult<BookingWithRoom> {
        self.bookings
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| BookingError::not_found("booking not found"))
    }

    /// Book `room_id` for an entitled user if the room has space left.
    ///
    /// A user that already holds a booking is not blocked here.
    pub async fn book_room_by_id(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> BookingResult<Booking> {
        self.check_entitlement(user_id).await?;

        let _gate = self.acquire_gate().await;
        self.check_capacity(room_id).await?;

        let booking = self.bookings.create(NewBooking { user_id, room_id }).await?;

        tracing::info!(
            booking_id = booking.id,
            user_id,
            room_id,
            "room booked"
        );
        Ok(booking)
    }

    /// Move the user's booking to `room_id`
    pub async fn update_booking(
        &self,
        user_id: UserId,
        room_id: RoomId,
    ) -> BookingResult<Booking> {
        let current = self.get_booking(user_id).await?;
        self.check_entitlement(user_id).await?;

        let _gate = self.acquire_gate().await;
        self.check_capacity(room_id).await?;

        if current.booking.room_id == room_id {
            tracing::debug!(
                booking_id = current.booking.id,
                room_id,
                "rejecting move to the same room"
            );
            return Err(BookingError::validation(SAME_ROOM));
        }

        let booking = self
            .bookings
            .upsert(UpsertBooking {
                id: current.booking.id,
                user_id,
                room_id,
            })
            .await?;

        tracing::info!(
            booking_id = booking.id,
            user_id,
            from_room_id = current.booking.room_id,
            to_room_id = room_id,
            "booking moved"
        );
        Ok(booking)
    }

    async fn check_entitlement(&self, user_id: UserId) -> BookingResult<()> {
        match self.entitlements.check(user_id).await? {
            Entitlement::Granted => Ok(()),
            Entitlement::Denied(reason) => {
                tracing::info!(user_id, %reason, "booking denied");
                Err(BookingError::validation(BOOKING_NOT_PERMITTED))
            }
        }
    }

    /// The room must exist and have fewer bookings than its capacity
    async fn check_capacity(&self, room_id: RoomId) -> BookingResult<Room> {
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| BookingError::not_found("room not found"))?;

        let occupied = self.bookings.find_by_room_id(room_id).await?.len();
        if occupied >= room.capacity as usize {
            tracing::info!(room_id, capacity = room.capacity, occupied, "room is full");
            return Err(BookingError::validation(ROOM_FULL));
        }

        Ok(room)
    }

    async fn acquire_gate(&self) -> Option<MutexGuard<'_, ()>> {
        if self.serialize_writes {
            Some(self.write_gate.lock().await)
        } else {
            None
        }
    }
}
