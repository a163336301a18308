use dotenvy::dotenv;
use std::env;
use ticket_buddy::{
    bot::{self, BotData},
    config::{database, guild::GuildConfig, settings},
    core::desk::TicketDesk,
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load support settings and guild ids
    let config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {}", e))?;
    let guild = GuildConfig::from_env();
    info!(
        staff_roles = [guild.admin_role_id, guild.mod_role_id].iter().flatten().count(),
        logs_channel = guild.ticket_logs_channel_id.is_some(),
        "Loaded configuration"
    );

    // 4. Open the database and make sure the statistics document is usable
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    let desk = TicketDesk::initialize(db)
        .await
        .inspect(|_| info!("Ticket desk initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize ticket desk: {}", e))?
        .with_recent_ticket_count(config.support.recent_ticket_count);

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(desk, config.support, guild)).await
}
