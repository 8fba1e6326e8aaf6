//! Room and booking persistence.
//!
//! The traits are the seam the booking service depends on; the in-memory
//! implementations back the application and the tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::models::{
    Booking, BookingId, BookingWithRoom, HotelId, NewBooking, Room, RoomId, UpsertBooking, UserId,
};

/// Read-only room lookups
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_by_id(&self, id: RoomId) -> anyhow::Result<Option<Room>>;

    /// Rooms of a hotel, ordered by id
    async fn find_all_by_hotel_id(&self, hotel_id: HotelId) -> anyhow::Result<Vec<Room>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, booking: NewBooking) -> anyhow::Result<Booking>;

    async fn find_by_room_id(&self, room_id: RoomId) -> anyhow::Result<Vec<BookingWithRoom>>;

    /// The user's first booking, if any
    async fn find_by_user_id(&self, user_id: UserId) -> anyhow::Result<Option<BookingWithRoom>>;

    /// Move an existing booking to `room_id`, or create a new booking for
    /// `user_id` when `id` does not exist.
    async fn upsert(&self, booking: UpsertBooking) -> anyhow::Result<Booking>;
}

#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    rooms: RwLock<BTreeMap<RoomId, Room>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        Self {
            rooms: RwLock::new(rooms.into_iter().map(|room| (room.id, room)).collect()),
        }
    }

    /// Insert or replace a room
    pub async fn insert(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn find_by_id(&self, id: RoomId) -> anyhow::Result<Option<Room>> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn find_all_by_hotel_id(&self, hotel_id: HotelId) -> anyhow::Result<Vec<Room>> {
        Ok(self
            .rooms
            .read()
            .await
            .values()
            .filter(|room| room.hotel_id == hotel_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct BookingTable {
    rows: BTreeMap<BookingId, Booking>,
    last_id: BookingId,
}

impl BookingTable {
    fn insert(&mut self, user_id: UserId, room_id: RoomId) -> Booking {
        self.last_id += 1;
        let now = OffsetDateTime::now_utc();
        let booking = Booking {
            id: self.last_id,
            user_id,
            room_id,
            created_at: now,
            updated_at: now,
        };
        self.rows.insert(booking.id, booking.clone());
        booking
    }
}

/// Booking table kept in memory. Joins against `rooms` for the lookups that
/// return room details.
pub struct InMemoryBookingStore {
    table: RwLock<BookingTable>,
    rooms: Arc<dyn RoomStore>,
}

impl InMemoryBookingStore {
    pub fn new(rooms: Arc<dyn RoomStore>) -> Self {
        Self {
            table: RwLock::new(BookingTable::default()),
            rooms,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn with_room(&self, booking: Booking) -> anyhow::Result<BookingWithRoom> {
        let room = self
            .rooms
            .find_by_id(booking.room_id)
            .await?
            .ok_or_else(|| {
                anyhow!(
                    "booking {} references unknown room {}",
                    booking.id,
                    booking.room_id
                )
            })?;

        Ok(BookingWithRoom { booking, room })
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn create(&self, booking: NewBooking) -> anyhow::Result<Booking> {
        let created = self
            .table
            .write()
            .await
            .insert(booking.user_id, booking.room_id);

        tracing::debug!(
            booking_id = created.id,
            user_id = created.user_id,
            room_id = created.room_id,
            "booking row inserted"
        );
        Ok(created)
    }

    async fn find_by_room_id(&self, room_id: RoomId) -> anyhow::Result<Vec<BookingWithRoom>> {
        let bookings: Vec<Booking> = self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|booking| booking.room_id == room_id)
            .cloned()
            .collect();

        let mut joined = Vec::with_capacity(bookings.len());
        for booking in bookings {
            joined.push(self.with_room(booking).await?);
        }
        Ok(joined)
    }

    async fn find_by_user_id(&self, user_id: UserId) -> anyhow::Result<Option<BookingWithRoom>> {
        let booking = self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|booking| booking.user_id == user_id)
            .cloned();

        match booking {
            Some(booking) => Ok(Some(self.with_room(booking).await?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, booking: UpsertBooking) -> anyhow::Result<Booking> {
        let mut table = self.table.write().await;

        if let Some(existing) = table.rows.get_mut(&booking.id) {
            existing.room_id = booking.room_id;
            existing.updated_at = OffsetDateTime::now_utc();
            tracing::debug!(
                booking_id = existing.id,
                room_id = existing.room_id,
                "booking row updated"
            );
            return Ok(existing.clone());
        }

        let created = table.insert(booking.user_id, booking.room_id);
        tracing::debug!(
            requested_id = booking.id,
            booking_id = created.id,
            "upsert found no booking; inserted a new row"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: RoomId, hotel_id: HotelId, capacity: u32) -> Room {
        Room {
            id,
            hotel_id,
            name: format!("Room {id}"),
            capacity,
        }
    }

    fn stores() -> (Arc<InMemoryRoomStore>, InMemoryBookingStore) {
        let rooms = Arc::new(InMemoryRoomStore::with_rooms([
            room(1, 10, 2),
            room(2, 10, 1),
            room(3, 20, 3),
        ]));
        let bookings = InMemoryBookingStore::new(rooms.clone());
        (rooms, bookings)
    }

    #[tokio::test]
    async fn rooms_are_found_by_id_and_hotel() {
        let (rooms, _) = stores();

        assert_eq!(rooms.find_by_id(2).await.unwrap().unwrap().capacity, 1);
        assert!(rooms.find_by_id(99).await.unwrap().is_none());

        let ids: Vec<RoomId> = rooms
            .find_all_by_hotel_id(10)
            .await
            .unwrap()
            .into_iter()
            .map(|room| room.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(rooms.find_all_by_hotel_id(30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_timestamps() {
        let (_, bookings) = stores();

        let first = bookings
            .create(NewBooking {
                user_id: 1,
                room_id: 1,
            })
            .await
            .unwrap();
        let second = bookings
            .create(NewBooking {
                user_id: 2,
                room_id: 1,
            })
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(bookings.len().await, 2);
    }

    #[tokio::test]
    async fn lookups_join_room_details() {
        let (_, bookings) = stores();
        for (user_id, room_id) in [(1, 1), (2, 1), (3, 2)] {
            bookings
                .create(NewBooking { user_id, room_id })
                .await
                .unwrap();
        }

        let in_room_one = bookings.find_by_room_id(1).await.unwrap();
        assert_eq!(in_room_one.len(), 2);
        assert!(in_room_one.iter().all(|b| b.room.id == 1));

        let of_user_three = bookings.find_by_user_id(3).await.unwrap().unwrap();
        assert_eq!(of_user_three.room, room(2, 10, 1));
        assert!(bookings.find_by_user_id(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_user_returns_the_first_booking() {
        let (_, bookings) = stores();
        bookings
            .create(NewBooking {
                user_id: 5,
                room_id: 3,
            })
            .await
            .unwrap();
        bookings
            .create(NewBooking {
                user_id: 5,
                room_id: 1,
            })
            .await
            .unwrap();

        let found = bookings.find_by_user_id(5).await.unwrap().unwrap();
        assert_eq!(found.booking.id, 1);
        assert_eq!(found.room.id, 3);
    }

    #[tokio::test]
    async fn upsert_moves_existing_booking() {
        let (_, bookings) = stores();
        let created = bookings
            .create(NewBooking {
                user_id: 1,
                room_id: 1,
            })
            .await
            .unwrap();

        let moved = bookings
            .upsert(UpsertBooking {
                id: created.id,
                user_id: 1,
                room_id: 3,
            })
            .await
            .unwrap();

        assert_eq!(moved.id, created.id);
        assert_eq!(moved.room_id, 3);
        assert_eq!(moved.created_at, created.created_at);
        assert!(moved.updated_at >= created.updated_at);
        assert_eq!(bookings.len().await, 1);
    }

    #[tokio::test]
    async fn upsert_creates_when_id_is_unknown() {
        let (_, bookings) = stores();

        let created = bookings
            .upsert(UpsertBooking {
                id: 42,
                user_id: 9,
                room_id: 2,
            })
            .await
            .unwrap();

        assert_eq!(created.user_id, 9);
        assert_eq!(created.room_id, 2);
        assert_eq!(bookings.len().await, 1);
    }

    #[tokio::test]
    async fn dangling_room_reference_is_an_error() {
        let (_, bookings) = stores();
        bookings
            .create(NewBooking {
                user_id: 1,
                room_id: 77,
            })
            .await
            .unwrap();

        let err = bookings.find_by_user_id(1).await.unwrap_err();
        assert!(err.to_string().contains("unknown room 77"));
    }
}
