//! Unified error type for the ticket desk and the Discord layer.
//!
//! Variants fall into three groups: lookups that found nothing
//! ([`Error::TicketNotFound`]), persistence failures ([`Error::Database`],
//! [`Error::StatsDocument`]) and rejected input ([`Error::InvalidRating`],
//! [`Error::InvalidCategory`], [`Error::TicketClosed`]).

use thiserror::Error;

/// Every error the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// No ticket exists with the given id or channel
    #[error("Ticket '{id}' not found")]
    TicketNotFound {
        /// The id (or channel id) that was looked up
        id: String,
    },

    /// A caller-supplied ticket id is already taken
    #[error("Ticket '{id}' already exists")]
    DuplicateTicket {
        /// The conflicting id
        id: String,
    },

    /// A staff member tried to claim a ticket that is already closed
    #[error("Ticket '{id}' is already closed")]
    TicketClosed {
        /// Id of the closed ticket
        id: String,
    },

    /// Rating outside the 1-5 range
    #[error("Invalid rating: {rating} (expected 1-5)")]
    InvalidRating {
        /// The rejected rating
        rating: i32,
    },

    /// Category text that does not map to a known ticket category
    #[error("Invalid ticket category: '{category}'")]
    InvalidCategory {
        /// The rejected category text
        category: String,
    },

    /// The stored statistics document could not be parsed or serialized
    #[error("Statistics document error: {message}")]
    StatsDocument {
        /// Underlying serde failure
        message: String,
    },

    /// The backing database could not be read or written
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Bad or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while building a message string
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/poise failure talking to Discord
    #[error("Serenity/Poise framework error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Serenity(Box::new(value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::StatsDocument {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
