//! Support desk settings loaded from config.toml
//!
//! Every field has a default, so a missing file or a missing `[support]`
//! table still yields a usable configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Ticket desk behaviour and branding
    #[serde(default)]
    pub support: SupportSettings,
}

/// Settings for the ticket workflow and dashboard
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SupportSettings {
    /// Community name shown in embeds and the bot presence
    pub brand: String,
    /// Seconds between closing a ticket and deleting its channel
    pub close_delay_secs: u64,
    /// Maximum number of messages included in a transcript
    pub transcript_limit: u8,
    /// Number of recent tickets kept in a dashboard snapshot
    pub recent_ticket_count: usize,
    /// Game server address shown by `/ip`
    pub server_address: String,
}

impl Default for SupportSettings {
    fn default() -> Self {
        Self {
            brand: "KWMC".to_string(),
            close_delay_secs: 5,
            transcript_limit: 100,
            recent_ticket_count: 10,
            server_address: "localhost:25565".to_string(),
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from `./config.toml`, falling back to defaults when the
/// file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::info!("No config.toml found, using default support settings");
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_support_settings() {
        let toml_str = r#"
            [support]
            brand = "Blocky"
            close_delay_secs = 10
            server_address = "play.blocky.net"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.support.brand, "Blocky");
        assert_eq!(config.support.close_delay_secs, 10);
        assert_eq!(config.support.server_address, "play.blocky.net");
        // Unspecified fields keep their defaults
        assert_eq!(config.support.transcript_limit, 100);
        assert_eq!(config.support.recent_ticket_count, 10);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.support.brand, "KWMC");
        assert_eq!(config.support.close_delay_secs, 5);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("definitely/not/here/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
