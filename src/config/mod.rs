/// Database configuration and connection management
pub mod database;

/// Role and channel IDs from environment variables
pub mod guild;

/// Support desk settings from config.toml
pub mod settings;
