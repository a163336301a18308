//! Bot layer - Discord-specific interface, commands and interaction handlers
//!
//! This module wires the ticket desk into poise: slash commands, the
//! component/modal handlers behind the ticket buttons, and the shared bot
//! context.

/// Discord command implementations (ticket, dashboard, general)
pub mod commands;
/// Discord interaction handlers (buttons, select menus, modals, presence)
pub mod handlers;

use crate::{
    config::{guild::GuildConfig, settings::SupportSettings},
    core::desk::TicketDesk,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::borrow::Borrow;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands and handlers.
pub struct BotData {
    /// Ticket store and statistics
    pub desk: TicketDesk,
    /// Support settings from config.toml
    pub settings: SupportSettings,
    /// Role and channel IDs from the environment
    pub guild: GuildConfig,
}

impl BotData {
    /// Creates the shared context handed to every command.
    #[must_use]
    pub const fn new(desk: TicketDesk, settings: SupportSettings, guild: GuildConfig) -> Self {
        Self {
            desk,
            settings,
            guild,
        }
    }
}

/// Poise context with our data and error types
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Whether a guild member counts as support staff: administrator or
/// manage-channels permission, or one of the configured staff roles.
#[must_use]
pub fn is_staff<M>(member: Option<&M>, guild: &GuildConfig) -> bool
where
    M: Borrow<serenity::Member>,
{
    let Some(member) = member.map(Borrow::borrow) else {
        return false;
    };

    let has_permission = member
        .permissions
        .is_some_and(|p| p.administrator() || p.manage_channels());
    let role_ids: Vec<u64> = member.roles.iter().map(|role| role.get()).collect();

    has_permission || guild.has_staff_role(&role_ids)
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            let reply = poise::CreateReply::default()
                .content(format!("❌ An error occurred: {error}"))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Starts the Discord client and blocks until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ticket(),
                commands::dashboard(),
                commands::ping(),
                commands::help(),
                commands::ip(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(
                    "Logged in as {} on {} guild(s)",
                    ready.user.name,
                    ready.guilds.len()
                );
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                handlers::presence::start_rotation(ctx.clone(), data.settings.brand.clone());
                Ok(data)
            })
        })
        .build();

    // Message content is needed for transcripts
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;

    Ok(())
}
