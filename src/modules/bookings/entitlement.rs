//! Booking entitlement: may this user book a hotel room at all?
//!
//! Enrollment and ticket records belong to other modules; this file only
//! reads them through [`TicketDirectory`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::models::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Reserved,
    Paid,
}

impl FromStr for TicketStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "RESERVED" => Ok(TicketStatus::Reserved),
            "PAID" => Ok(TicketStatus::Paid),
            other => Err(anyhow!(
                "unknown ticket status '{other}'; expected RESERVED or PAID"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketType {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub is_remote: bool,
    pub includes_hotel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: i64,
    pub enrollment_id: i64,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
}

/// Why a user may not book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NoEnrollment,
    NoTicket,
    TicketNotPaid,
    RemoteTicket,
    HotelNotIncluded,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Denial::NoEnrollment => "user has no enrollment",
            Denial::NoTicket => "enrollment has no ticket",
            Denial::TicketNotPaid => "ticket is not paid",
            Denial::RemoteTicket => "ticket is for remote attendance",
            Denial::HotelNotIncluded => "ticket does not include hotel",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Granted,
    Denied(Denial),
}

impl Entitlement {
    #[cfg(test)]
    pub fn is_granted(&self) -> bool {
        matches!(self, Entitlement::Granted)
    }
}

#[async_trait]
pub trait EntitlementCheck: Send + Sync {
    async fn check(&self, user_id: UserId) -> anyhow::Result<Entitlement>;
}

/// Read-only view over enrollments and tickets
#[async_trait]
pub trait TicketDirectory: Send + Sync {
    async fn find_enrollment_by_user_id(&self, user_id: UserId)
        -> anyhow::Result<Option<Enrollment>>;

    async fn find_ticket_by_enrollment_id(&self, enrollment_id: i64)
        -> anyhow::Result<Option<Ticket>>;
}

/// Grants booking to users holding a paid, in-person, hotel-inclusive ticket.
pub struct TicketEntitlement {
    directory: Arc<dyn TicketDirectory>,
}

impl TicketEntitlement {
    pub fn new(directory: Arc<dyn TicketDirectory>) -> Self {
        Self { directory }
    }

    /// Classify a ticket on its own
    pub fn evaluate(ticket: &Ticket) -> Entitlement {
        if ticket.status == TicketStatus::Reserved {
            Entitlement::Denied(Denial::TicketNotPaid)
        } else if ticket.ticket_type.is_remote {
            Entitlement::Denied(Denial::RemoteTicket)
        } else if !ticket.ticket_type.includes_hotel {
            Entitlement::Denied(Denial::HotelNotIncluded)
        } else {
            Entitlement::Granted
        }
    }
}

#[async_trait]
impl EntitlementCheck for TicketEntitlement {
    async fn check(&self, user_id: UserId) -> anyhow::Result<Entitlement> {
        let Some(enrollment) = self.directory.find_enrollment_by_user_id(user_id).await? else {
            return Ok(Entitlement::Denied(Denial::NoEnrollment));
        };

        let Some(ticket) = self
            .directory
            .find_ticket_by_enrollment_id(enrollment.id)
            .await?
        else {
            return Ok(Entitlement::Denied(Denial::NoTicket));
        };

        Ok(Self::evaluate(&ticket))
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    enrollments: HashMap<UserId, Enrollment>,
    tickets: HashMap<i64, Ticket>,
    last_id: i64,
}

/// In-memory enrollment/ticket records
#[derive(Debug, Default)]
pub struct InMemoryTicketDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryTicketDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll a user, returning the existing enrollment if there is one
    pub async fn enroll(&self, user_id: UserId) -> Enrollment {
        let mut state = self.state.write().await;
        if let Some(existing) = state.enrollments.get(&user_id) {
            return existing.clone();
        }

        state.last_id += 1;
        let enrollment = Enrollment {
            id: state.last_id,
            user_id,
        };
        state.enrollments.insert(user_id, enrollment.clone());
        enrollment
    }

    /// Enroll the user if needed and give them a ticket, replacing any
    /// previous one.
    pub async fn issue_ticket(
        &self,
        user_id: UserId,
        ticket_type: TicketType,
        status: TicketStatus,
    ) -> Ticket {
        let enrollment = self.enroll(user_id).await;

        let mut state = self.state.write().await;
        state.last_id += 1;
        let ticket = Ticket {
            id: state.last_id,
            enrollment_id: enrollment.id,
            status,
            ticket_type,
        };
        state.tickets.insert(enrollment.id, ticket.clone());
        ticket
    }
}

#[async_trait]
impl TicketDirectory for InMemoryTicketDirectory {
    async fn find_enrollment_by_user_id(
        &self,
        user_id: UserId,
    ) -> anyhow::Result<Option<Enrollment>> {
        Ok(self.state.read().await.enrollments.get(&user_id).cloned())
    }

    async fn find_ticket_by_enrollment_id(
        &self,
        enrollment_id: i64,
    ) -> anyhow::Result<Option<Ticket>> {
        Ok(self.state.read().await.tickets.get(&enrollment_id).cloned())
    }
}
