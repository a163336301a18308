//! Guild configuration loaded from environment variables.
//!
//! Role and channel IDs come from the `.env` file. Values that are unset,
//! not numeric, or still the template placeholder (e.g. `CARGO_ADMIN_ID_AQUI`)
//! are treated as not configured.

/// Discord IDs the ticket workflow needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildConfig {
    /// Administrator role, grants staff rights
    pub admin_role_id: Option<u64>,
    /// Moderator role, grants staff rights
    pub mod_role_id: Option<u64>,
    /// Category channel new ticket channels are created under
    pub ticket_category_id: Option<u64>,
    /// Channel that receives ticket open/close logs
    pub ticket_logs_channel_id: Option<u64>,
}

impl GuildConfig {
    /// Reads the guild configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, used by tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let id = |key: &str| lookup(key).as_deref().and_then(parse_id);
        Self {
            admin_role_id: id("ADMIN_ROLE_ID"),
            mod_role_id: id("MOD_ROLE_ID"),
            ticket_category_id: id("TICKET_CATEGORY_ID"),
            ticket_logs_channel_id: id("TICKET_LOGS_CHANNEL_ID"),
        }
    }

    /// Whether any of the given role IDs is a configured staff role.
    #[must_use]
    pub fn has_staff_role(&self, role_ids: &[u64]) -> bool {
        [self.admin_role_id, self.mod_role_id]
            .into_iter()
            .flatten()
            .any(|staff| role_ids.contains(&staff))
    }
}

/// Parses a Discord snowflake, rejecting placeholders and zero.
fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}
