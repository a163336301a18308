//! Ticket desk - the store and the statistics aggregator behind one write guard.
//!
//! Every mutating operation holds [`TicketDesk`]'s mutex and runs in a single
//! database transaction that writes the ticket row and the statistics document
//! together, so either both changes are committed or neither is. Reads go
//! straight to the database without taking the guard.

use crate::{
    config::database,
    core::{
        dashboard::DashboardStats,
        stats::{self, TicketStats},
        ticket::{self as store, NewTicket},
    },
    entities::ticket,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tokio::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_RECENT_TICKETS: usize = 10;

/// What a close request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The ticket was open or claimed and is now closed
    Closed(ticket::Model),
    /// The ticket was closed before; nothing changed
    AlreadyClosed(ticket::Model),
}

impl CloseOutcome {
    /// The stored ticket, whichever way the close went.
    #[must_use]
    pub fn into_ticket(self) -> ticket::Model {
        match self {
            Self::Closed(ticket) | Self::AlreadyClosed(ticket) => ticket,
        }
    }
}

/// Owns the database connection and serializes all ticket mutations.
#[derive(Debug)]
pub struct TicketDesk {
    db: DatabaseConnection,
    write_lock: Mutex<()>,
    recent_ticket_count: usize,
}

impl TicketDesk {
    /// Wraps an already prepared database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
            recent_ticket_count: DEFAULT_RECENT_TICKETS,
        }
    }

    /// Creates the tables if needed and makes sure a readable statistics
    /// document exists, rebuilding it from the ticket log when it is missing
    /// or corrupt.
    pub async fn initialize(db: DatabaseConnection) -> Result<Self> {
        database::create_tables(&db).await?;
        let desk = Self::new(db);

        let (stats, rebuilt) = stats::load_or_rebuild(&desk.db).await?;
        if rebuilt {
            stats::save_stats(&desk.db, &stats).await?;
            info!(
                total_tickets = stats.total_tickets,
                "Statistics document initialized from ticket log"
            );
        }

        Ok(desk)
    }

    /// Sets how many recent tickets a snapshot carries.
    #[must_use]
    pub const fn with_recent_ticket_count(mut self, count: usize) -> Self {
        self.recent_ticket_count = count;
        self
    }

    /// The underlying database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Opens a new ticket and counts it in the statistics.
    pub async fn create_ticket(&self, new: NewTicket) -> Result<ticket::Model> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let (mut stats, rebuilt) = stats::load_or_rebuild(&txn).await?;
        let ticket = store::insert_ticket(&txn, new, Utc::now()).await?;
        stats.on_ticket_created(&ticket);
        stats::save_stats(&txn, &stats).await?;

        txn.commit().await?;

        if rebuilt {
            warn!("Statistics document was rebuilt while creating a ticket");
        }
        info!(
            ticket_id = %ticket.id,
            requester = %ticket.requester_id,
            category = %ticket.category,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// Records a staff member as the handler of a ticket. Repeated claims
    /// replace the previous claimer.
    ///
    /// # Errors
    /// * [`Error::TicketNotFound`] - no ticket with this id
    /// * [`Error::TicketClosed`] - the ticket is already closed
    pub async fn claim_ticket(
        &self,
        ticket_id: &str,
        staff_id: &str,
        staff_name: &str,
    ) -> Result<ticket::Model> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ticket = store::get_by_id(&txn, ticket_id)
            .await?
            .ok_or_else(|| Error::TicketNotFound {
                id: ticket_id.to_string(),
            })?;
        let ticket = store::set_claimed(&txn, ticket, staff_id, staff_name, Utc::now()).await?;

        txn.commit().await?;

        info!(ticket_id = %ticket.id, staff = %staff_id, "Ticket claimed");
        Ok(ticket)
    }

    /// Closes a ticket with an optional 1-5 rating and feedback.
    ///
    /// Closing a ticket that is already closed returns the stored record
    /// unchanged and leaves the statistics alone.
    ///
    /// # Errors
    /// * [`Error::InvalidRating`] - rating outside 1-5
    /// * [`Error::TicketNotFound`] - no ticket with this id
    pub async fn close_ticket(
        &self,
        ticket_id: &str,
        closed_by: &str,
        rating: Option<i32>,
        feedback: Option<String>,
    ) -> Result<ticket::Model> {
        self.try_close_ticket(ticket_id, closed_by, rating, feedback)
            .await
            .map(CloseOutcome::into_ticket)
    }

    /// Like [`TicketDesk::close_ticket`], but tells whether this call closed
    /// the ticket or found it already closed. In the latter case the given
    /// rating and feedback were not recorded.
    ///
    /// # Errors
    /// * [`Error::InvalidRating`] - rating outside 1-5
    /// * [`Error::TicketNotFound`] - no ticket with this id
    pub async fn try_close_ticket(
        &self,
        ticket_id: &str,
        closed_by: &str,
        rating: Option<i32>,
        feedback: Option<String>,
    ) -> Result<CloseOutcome> {
        let rating = rating.map(store::validate_rating).transpose()?;

        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let ticket = store::get_by_id(&txn, ticket_id)
            .await?
            .ok_or_else(|| Error::TicketNotFound {
                id: ticket_id.to_string(),
            })?;

        if ticket.is_closed() {
            info!(ticket_id = %ticket.id, "Ticket already closed, nothing to do");
            return Ok(CloseOutcome::AlreadyClosed(ticket));
        }

        let (mut stats, rebuilt) = stats::load_or_rebuild(&txn).await?;
        let ticket =
            store::set_closed(&txn, ticket, closed_by, rating, feedback, Utc::now()).await?;
        stats.on_ticket_closed(&ticket);
        stats::save_stats(&txn, &stats).await?;

        txn.commit().await?;

        if rebuilt {
            warn!("Statistics document was rebuilt while closing a ticket");
        }
        info!(
            ticket_id = %ticket.id,
            closed_by = %closed_by,
            rating = ?ticket.rating,
            "Ticket closed"
        );
        Ok(CloseOutcome::Closed(ticket))
    }

    /// Every ticket in insertion order.
    pub async fn get_all(&self) -> Result<Vec<ticket::Model>> {
        store::get_all(&self.db).await
    }

    /// Looks up a ticket by id.
    pub async fn get_by_id(&self, ticket_id: &str) -> Result<Option<ticket::Model>> {
        store::get_by_id(&self.db, ticket_id).await
    }

    /// All tickets opened by a requester.
    pub async fn get_by_requester(&self, requester_id: &str) -> Result<Vec<ticket::Model>> {
        store::get_by_requester(&self.db, requester_id).await
    }

    /// The ticket backed by a Discord channel.
    pub async fn get_by_channel(&self, channel_id: &str) -> Result<Option<ticket::Model>> {
        store::get_by_channel(&self.db, channel_id).await
    }

    /// The requester's ticket that is still open or claimed.
    pub async fn open_ticket_for(&self, requester_id: &str) -> Result<Option<ticket::Model>> {
        store::open_ticket_for(&self.db, requester_id).await
    }

    /// The current statistics document, rebuilt in memory if unreadable.
    pub async fn stats(&self) -> Result<TicketStats> {
        stats::load_or_rebuild(&self.db)
            .await
            .map(|(stats, _)| stats)
    }

    /// Dashboard snapshot as of now.
    pub async fn snapshot(&self) -> Result<DashboardStats> {
        self.snapshot_at(Utc::now()).await
    }

    /// Dashboard snapshot as of `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let stats = self.stats().await?;
        let tickets = store::get_all(&self.db).await?;
        Ok(DashboardStats::compute(
            &stats,
            &tickets,
            now,
            self.recent_ticket_count,
        ))
    }

    /// Recomputes the statistics document from the full ticket log and
    /// stores it.
    pub async fn rebuild_stats(&self) -> Result<TicketStats> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let tickets = store::get_all(&txn).await?;
        let stats = TicketStats::rebuild(&tickets);
        stats::save_stats(&txn, &stats).await?;

        txn.commit().await?;

        info!(
            total_tickets = stats.total_tickets,
            closed_tickets = stats.closed_tickets,
            "Statistics document rebuilt"
        );
        Ok(stats)
    }
}
