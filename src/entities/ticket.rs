//! Ticket entity - one row per support request.
//!
//! Tickets are never deleted. The Discord channel backing a ticket may be
//! removed after close, but the record stays as part of the ticket log that
//! the statistics document is derived from.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket. Transitions only move forward:
/// `open -> claimed -> closed` or `open -> closed`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Waiting for a staff member
    #[sea_orm(string_value = "open")]
    Open,
    /// A staff member is handling the ticket
    #[sea_orm(string_value = "claimed")]
    Claimed,
    /// Finished; `closed_at` and `closed_by` are set
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Fixed set of ticket categories.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    /// Bugs and technical problems
    #[sea_orm(string_value = "bug")]
    Bug,
    /// General questions
    #[sea_orm(string_value = "question")]
    Question,
    /// Economy and shop issues
    #[sea_orm(string_value = "economy")]
    Economy,
    /// Player reports
    #[sea_orm(string_value = "report")]
    Report,
    /// Suggestions for the server
    #[sea_orm(string_value = "suggestion")]
    Suggestion,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Ticket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Unique identifier, `ticket-<unix millis>` unless supplied by the caller
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Discord user ID of the member who opened the ticket
    pub requester_id: String,
    /// Discord username of the member who opened the ticket
    pub requester_name: String,
    /// In-game nickname given in the ticket form, if any
    pub game_nick: Option<String>,
    /// Ticket category
    pub category: TicketCategory,
    /// Free text description of the problem
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Discord channel created for this ticket
    pub channel_id: Option<String>,
    /// Current lifecycle state
    pub status: TicketStatus,
    /// When the ticket was opened
    pub created_at: DateTimeUtc,
    /// Discord user ID of the staff member who claimed the ticket
    pub claimed_by_id: Option<String>,
    /// Name of the staff member who claimed the ticket
    pub claimed_by_name: Option<String>,
    /// When the ticket was (last) claimed
    pub claimed_at: Option<DateTimeUtc>,
    /// When the ticket was closed
    pub closed_at: Option<DateTimeUtc>,
    /// Username of whoever closed the ticket
    pub closed_by: Option<String>,
    /// Requester rating from 1 to 5, given at close time
    pub rating: Option<i32>,
    /// Optional comment left with the rating
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
}

/// The `claimedBy` record of a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedBy {
    /// Discord user ID of the staff member
    pub staff_id: String,
    /// Display name of the staff member
    pub staff_name: String,
    /// When the claim happened
    pub claimed_at: DateTimeUtc,
}

impl Model {
    /// Returns the claim record when all claim columns are present.
    #[must_use]
    pub fn claimed_by(&self) -> Option<ClaimedBy> {
        match (&self.claimed_by_id, &self.claimed_by_name, self.claimed_at) {
            (Some(staff_id), Some(staff_name), Some(claimed_at)) => Some(ClaimedBy {
                staff_id: staff_id.clone(),
                staff_name: staff_name.clone(),
                claimed_at,
            }),
            _ => None,
        }
    }

    /// Whether the ticket has reached its final state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == TicketStatus::Closed
    }
}

/// Tickets have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
