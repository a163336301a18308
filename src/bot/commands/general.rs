//! General Discord commands - ping, help and server address.
//! These commands don't touch the ticket store.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};
    use poise::serenity_prelude as serenity;
    use std::time::Instant;

    /// Checks that the bot is responsive and shows the round-trip time.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        let started = Instant::now();
        let reply = ctx.say("🏓 Pong!").await?;
        let elapsed = started.elapsed().as_millis();
        reply
            .edit(
                ctx,
                poise::CreateReply::default().content(format!("🏓 Pong! `{elapsed}ms`")),
            )
            .await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let brand = &ctx.data().settings.brand;
        let embed = serenity::CreateEmbed::new()
            .title(format!("❓ {brand} Support Help"))
            .description("Here is a summary of the available commands.")
            .color(0x0058_65F2)
            .field(
                "🎫 Tickets",
                "• `/ticket open <category> <description>` - Opens a private support ticket.\n\
                 • `/ticket close` - Closes the ticket of the current channel.\n\
                 • `/ticket setup` - Posts the ticket panel (staff).",
                false,
            )
            .field(
                "📊 Dashboard (staff)",
                "• `/dashboard general` - Totals, satisfaction and recent tickets.\n\
                 • `/dashboard staff` - Staff ranking.\n\
                 • `/dashboard categories` - Tickets per category.",
                false,
            )
            .field(
                "🔧 Utility",
                "• `/ip` - Shows the server address.\n\
                 • `/ping` - Checks if the bot is responsive.\n\
                 • `/help` - Shows this help message.",
                false,
            );

        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Shows the game server address.
    #[poise::command(slash_command)]
    pub async fn ip(ctx: Context<'_>) -> Result<()> {
        let settings = &ctx.data().settings;
        let embed = serenity::CreateEmbed::new()
            .title(format!("🌐 {}", settings.brand))
            .description(format!("Server address: `{}`", settings.server_address))
            .color(0x002E_CC71);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
