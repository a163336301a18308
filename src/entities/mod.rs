//! Entity module - SeaORM entity definitions for the database.
//! `tickets` holds the ticket log, `system_state` holds derived documents
//! such as the statistics aggregate.

pub mod system_state;
pub mod ticket;

pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use ticket::{
    ClaimedBy, Column as TicketColumn, Entity as Ticket, Model as TicketModel, TicketCategory,
    TicketStatus,
};
