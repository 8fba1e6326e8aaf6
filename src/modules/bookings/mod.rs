pub mod entitlement;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use lodge_kernel::{settings::BookingSettings, InitCtx, Migration, Module};
use serde_json::json;

use entitlement::{InMemoryTicketDirectory, TicketEntitlement};
use service::BookingService;
use store::{InMemoryBookingStore, InMemoryRoomStore};

/// Room bookings for ticket holders
pub struct BookingsModule {
    service: Arc<BookingService>,
    rooms: Arc<InMemoryRoomStore>,
    directory: Arc<InMemoryTicketDirectory>,
}

impl BookingsModule {
    /// Wire the service over in-memory stores. Fixtures from the settings are
    /// loaded during `init`.
    pub fn in_memory(settings: &BookingSettings) -> Self {
        let rooms = Arc::new(InMemoryRoomStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new(rooms.clone()));
        let directory = Arc::new(InMemoryTicketDirectory::new());

        let service = BookingService::new(
            rooms.clone(),
            bookings,
            Arc::new(TicketEntitlement::new(directory.clone())),
        )
        .serialize_writes(settings.serialize_writes);

        Self {
            service: Arc::new(service),
            rooms,
            directory,
        }
    }

    pub fn service(&self) -> Arc<BookingService> {
        self.service.clone()
    }

    pub fn rooms(&self) -> &Arc<InMemoryRoomStore> {
        &self.rooms
    }

    pub fn directory(&self) -> &Arc<InMemoryTicketDirectory> {
        &self.directory
    }
}

#[async_trait]
impl Module for BookingsModule {
    fn name(&self) -> &'static str {
        "bookings"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let report =
            seed::apply(&ctx.settings.bookings.seed, &self.rooms, &self.directory).await?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            serialize_writes = ctx.settings.bookings.serialize_writes,
            seeded_rooms = report.rooms,
            seeded_tickets = report.tickets,
            "bookings module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookingRequest" }
                }
            }
        });
        let booking = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Booking" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Get the caller's booking",
                        "tags": ["Bookings"],
                        "responses": {
                            "200": {
                                "description": "Booking with its room",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookingSummary" }
                                    }
                                }
                            },
                            "401": error("Missing or invalid user identity"),
                            "404": error("The caller has no booking")
                        }
                    },
                    "post": {
                        "summary": "Book a room",
                        "tags": ["Bookings"],
                        "requestBody": body.clone(),
                        "responses": {
                            "201": booking("Booking created"),
                            "400": error("Room id is required"),
                            "401": error("Missing or invalid user identity"),
                            "404": error("Room not found"),
                            "422": error("Booking not permitted or room is full")
                        }
                    }
                },
                "/{bookingId}": {
                    "put": {
                        "summary": "Move the caller's booking to another room",
                        "tags": ["Bookings"],
                        "parameters": [{
                            "name": "bookingId",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "integer", "format": "int64" }
                        }],
                        "requestBody": body,
                        "responses": {
                            "200": booking("Booking updated"),
                            "400": error("Room id or booking id is missing"),
                            "401": error("Missing or invalid user identity"),
                            "404": error("Booking or room not found"),
                            "422": error("Booking not permitted, room is full, or same room")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Room": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "hotelId": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" },
                            "capacity": { "type": "integer", "minimum": 1 }
                        },
                        "required": ["id", "hotelId", "name", "capacity"]
                    },
                    "Booking": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "userId": { "type": "integer", "format": "int64" },
                            "roomId": { "type": "integer", "format": "int64" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "userId", "roomId", "createdAt", "updatedAt"]
                    },
                    "BookingSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "Room": { "$ref": "#/components/schemas/Room" }
                        },
                        "required": ["id", "Room"]
                    },
                    "BookingRequest": {
                        "type": "object",
                        "properties": {
                            "roomId": { "type": "integer", "format": "int64" }
                        },
                        "required": ["roomId"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_rooms",
                up: r#"
                CREATE TABLE IF NOT EXISTS room (
                    id         BIGSERIAL PRIMARY KEY,
                    hotel_id   BIGINT      NOT NULL,
                    name       TEXT        NOT NULL,
                    capacity   INTEGER     NOT NULL CHECK (capacity > 0),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                CREATE INDEX IF NOT EXISTS room_hotel_id_idx ON room (hotel_id);
                "#,
            },
            Migration {
                id: "002_bookings",
                up: r#"
                CREATE TABLE IF NOT EXISTS booking (
                    id         BIGSERIAL PRIMARY KEY,
                    user_id    BIGINT      NOT NULL,
                    room_id    BIGINT      NOT NULL REFERENCES room (id),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                CREATE INDEX IF NOT EXISTS booking_room_id_idx ON booking (room_id);
                CREATE INDEX IF NOT EXISTS booking_user_id_idx ON booking (user_id);
                "#,
            },
        ]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "bookings module stopped");
        Ok(())
    }
}

pub fn create_module(settings: &BookingSettings) -> Arc<BookingsModule> {
    Arc::new(BookingsModule::in_memory(settings))
}
