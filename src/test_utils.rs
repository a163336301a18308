//! Shared test utilities for `TicketBuddy`.
//!
//! Helpers for setting up in-memory databases and building tickets with
//! sensible defaults.

use crate::{
    core::{desk::TicketDesk, ticket::NewTicket},
    entities::{TicketCategory, TicketStatus, ticket},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a ticket desk on a fresh in-memory database.
pub async fn setup_desk() -> Result<TicketDesk> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    TicketDesk::initialize(db).await
}

/// Ticket input for `requester_id` with a generated name and description.
///
/// # Defaults
/// * `requester_name`: `"user-<requester_id>"`
/// * `description`: `"Test ticket"`
/// * no id, nickname or channel
pub fn sample_ticket(requester_id: &str, category: TicketCategory) -> NewTicket {
    NewTicket::new(
        requester_id,
        format!("user-{requester_id}"),
        category,
        "Test ticket",
    )
}

/// An open ticket model that is not stored anywhere, for aggregator tests.
pub fn ticket_model(
    id: &str,
    requester_id: &str,
    category: TicketCategory,
    created_at: DateTime<Utc>,
) -> ticket::Model {
    ticket::Model {
        id: id.to_string(),
        requester_id: requester_id.to_string(),
        requester_name: format!("user-{requester_id}"),
        game_nick: None,
        category,
        description: "Test ticket".to_string(),
        channel_id: None,
        status: TicketStatus::Open,
        created_at,
        claimed_by_id: None,
        claimed_by_name: None,
        claimed_at: None,
        closed_at: None,
        closed_by: None,
        rating: None,
        feedback: None,
    }
}
