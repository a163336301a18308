//! Ticket Discord commands - open, close and panel setup.

use crate::entities::TicketCategory;

/// Category picker for `/ticket open`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum CategoryChoice {
    #[name = "🐛 Bug/Problem"]
    Bug,
    #[name = "❓ Question"]
    Question,
    #[name = "💰 Economy/Shop"]
    Economy,
    #[name = "👤 Player Report"]
    Report,
    #[name = "🎮 Suggestion"]
    Suggestion,
    #[name = "📋 Other"]
    Other,
}

impl From<CategoryChoice> for TicketCategory {
    fn from(choice: CategoryChoice) -> Self {
        match choice {
            CategoryChoice::Bug => Self::Bug,
            CategoryChoice::Question => Self::Question,
            CategoryChoice::Economy => Self::Economy,
            CategoryChoice::Report => Self::Report,
            CategoryChoice::Suggestion => Self::Suggestion,
            CategoryChoice::Other => Self::Other,
        }
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::CategoryChoice;
    use crate::{
        bot::{
            Context,
            handlers::tickets::{self, OpenOutcome, TicketRequest},
            is_staff,
        },
        entities::TicketCategory,
        errors::Result,
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    async fn reply_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(content)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Support tickets.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("open", "close", "setup"),
        subcommand_required
    )]
    pub async fn ticket(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Opens a private support ticket.
    #[poise::command(slash_command, guild_only)]
    pub async fn open(
        ctx: Context<'_>,
        #[description = "What is your ticket about?"] category: CategoryChoice,
        #[description = "Describe your issue"]
        #[max_length = 1000]
        description: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return reply_ephemeral(ctx, "❌ Tickets can only be opened in a server.").await;
        };

        ctx.defer_ephemeral().await?;

        let request = TicketRequest {
            category: category.into(),
            description,
            game_nick: None,
        };
        let outcome =
            tickets::open_ticket(ctx.serenity_context(), ctx.data(), guild_id, ctx.author(), request)
                .await?;

        let content = match outcome {
            OpenOutcome::AlreadyOpen(existing) => existing.channel_id.map_or_else(
                || format!("❌ You already have an open ticket ({}).", existing.id),
                |channel_id| format!("❌ You already have an open ticket: <#{channel_id}>"),
            ),
            OpenOutcome::Created { channel_id, .. } => {
                format!("✅ Your ticket has been created: <#{channel_id}>")
            }
        };
        reply_ephemeral(ctx, content).await
    }

    /// Closes the ticket of this channel.
    #[poise::command(slash_command, guild_only)]
    pub async fn close(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let Some(ticket) = data
            .desk
            .get_by_channel(&ctx.channel_id().to_string())
            .await?
        else {
            return reply_ephemeral(ctx, "❌ This command only works inside a ticket channel.")
                .await;
        };
        if ticket.is_closed() {
            return reply_ephemeral(ctx, tickets::ALREADY_CLOSED).await;
        }

        let member = ctx.author_member().await;
        let is_owner = ticket.requester_id == ctx.author().id.to_string();
        if !is_owner && !is_staff(member.as_deref(), &data.guild) {
            return reply_ephemeral(ctx, "❌ You cannot close this ticket.").await;
        }

        let closed = tickets::finish_close(
            ctx.serenity_context(),
            data,
            &ticket.id,
            ctx.author(),
            None,
            None,
        )
        .await?;
        let Some((_, embed)) = closed else {
            return reply_ephemeral(ctx, tickets::ALREADY_CLOSED).await;
        };
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Posts the ticket panel with the "open ticket" button (staff).
    #[poise::command(slash_command, guild_only)]
    pub async fn setup(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let member = ctx.author_member().await;
        if !is_staff(member.as_deref(), &data.guild) {
            return reply_ephemeral(ctx, "❌ Only staff can set up the ticket panel.").await;
        }

        let brand = &data.settings.brand;
        let mut categories = String::new();
        for category in TicketCategory::ALL {
            writeln!(categories, "{} **{}**", category.emoji(), category.label())?;
        }

        let embed = serenity::CreateEmbed::new()
            .title(format!("🎫 {brand} Support"))
            .description(
                "Need help? Click the button below to open a private ticket \
                 with our staff.\n\nPlease include your in-game nickname and \
                 as much detail as you can.",
            )
            .field("Categories", categories, false)
            .color(tickets::TICKET_COLOR)
            .footer(serenity::CreateEmbedFooter::new(format!("{brand} Support")));
        let button = serenity::CreateButton::new("create_ticket_button")
            .label("Open ticket")
            .emoji('🎫')
            .style(serenity::ButtonStyle::Primary);

        ctx.channel_id()
            .send_message(
                ctx,
                serenity::CreateMessage::new()
                    .embed(embed)
                    .components(vec![serenity::CreateActionRow::Buttons(vec![button])]),
            )
            .await?;

        reply_ephemeral(ctx, "✅ Ticket panel posted.").await
    }
}

pub use inner::*;
