//! Loads configured rooms and tickets into the in-memory stores.

use std::collections::HashMap;

use anyhow::{bail, Context};
use lodge_kernel::settings::SeedSettings;

use super::entitlement::{InMemoryTicketDirectory, TicketStatus, TicketType};
use super::models::Room;
use super::store::InMemoryRoomStore;

/// Counts of the fixtures loaded by [`apply`]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub rooms: usize,
    pub tickets: usize,
}

pub async fn apply(
    seed: &SeedSettings,
    rooms: &InMemoryRoomStore,
    directory: &InMemoryTicketDirectory,
) -> anyhow::Result<SeedReport> {
    for room in &seed.rooms {
        if room.capacity == 0 {
            bail!("room {} must have a positive capacity", room.id);
        }
        rooms
            .insert(Room {
                id: room.id,
                hotel_id: room.hotel_id,
                name: room.name.clone(),
                capacity: room.capacity,
            })
            .await;
    }

    let ticket_types: HashMap<i64, TicketType> = seed
        .ticket_types
        .iter()
        .map(|kind| {
            (
                kind.id,
                TicketType {
                    id: kind.id,
                    name: kind.name.clone(),
                    price: kind.price,
                    is_remote: kind.is_remote,
                    includes_hotel: kind.includes_hotel,
                },
            )
        })
        .collect();

    for ticket in &seed.tickets {
        let kind = ticket_types.get(&ticket.ticket_type_id).with_context(|| {
            format!(
                "ticket for user {} references unknown ticket type {}",
                ticket.user_id, ticket.ticket_type_id
            )
        })?;
        let status: TicketStatus = ticket
            .status
            .parse()
            .with_context(|| format!("invalid ticket for user {}", ticket.user_id))?;

        directory
            .issue_ticket(ticket.user_id, kind.clone(), status)
            .await;
    }

    Ok(SeedReport {
        rooms: seed.rooms.len(),
        tickets: seed.tickets.len(),
    })
}
