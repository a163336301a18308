//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Staff dashboard commands and embed builders
pub mod dashboard;

/// General utility commands
pub mod general;

/// Ticket commands
pub mod ticket;

// Export top-level commands; subcommands are registered through their parent
pub use dashboard::dashboard;
pub use general::*;
pub use ticket::ticket;
