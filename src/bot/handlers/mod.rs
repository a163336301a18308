//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions that are not slash
//! commands: ticket and dashboard buttons, the rating select menu, form
//! submissions and the rotating presence.

/// Button and select-menu handlers
pub mod components;
/// Ticket and feedback form handlers
pub mod modals;
/// Rotating bot presence
pub mod presence;
/// Ticket channel workflow shared with the slash commands
pub mod tickets;

use crate::{
    bot::BotData,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::info;

/// Poise event handler: routes component and modal interactions.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "{} is connected to {} guild(s)",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => components::handle_component(ctx, component, data).await?,
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Modal(modal),
        } => modals::handle_modal(ctx, modal, data).await?,
        _ => {}
    }
    Ok(())
}
