//! Core ticket logic - framework-agnostic store, statistics and rendering.

/// Dashboard snapshot and display helpers
pub mod dashboard;
/// Ticket desk service pairing the store and the aggregator
pub mod desk;
/// Statistics aggregator and its stored document
pub mod stats;
/// Ticket store operations
pub mod ticket;
/// Plain-text transcripts
pub mod transcript;
