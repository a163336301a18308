//! Ticket channel workflow shared by the slash commands and the ticket
//! buttons: channel creation, close handling, log channel and delayed
//! channel deletion.

use crate::{
    bot::BotData,
    config::guild::GuildConfig,
    core::{desk::CloseOutcome, ticket::NewTicket},
    entities::{TicketCategory, ticket},
    errors::Result,
};
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

/// Accent colour for ticket embeds
pub const TICKET_COLOR: u32 = 0x0000_D4FF;
/// Colour for claim notices
pub const CLAIM_COLOR: u32 = 0x00FF_AA00;
/// Colour for close notices
pub const CLOSED_COLOR: u32 = 0x00FF_4444;

const MAX_CHANNEL_NAME: usize = 100;
const MAX_FIELD_LEN: usize = 1024;

/// What a user asked for when opening a ticket.
#[derive(Debug, Clone)]
pub struct TicketRequest {
    /// Reason for the ticket
    pub category: TicketCategory,
    /// Free-text description
    pub description: String,
    /// In-game nickname, when given
    pub game_nick: Option<String>,
}

/// Result of an open attempt.
#[derive(Debug)]
pub enum OpenOutcome {
    /// The user already has a ticket that is not closed
    AlreadyOpen(ticket::Model),
    /// A channel was created and the ticket recorded
    Created {
        /// Stored ticket
        ticket: ticket::Model,
        /// Channel backing the ticket
        channel_id: serenity::ChannelId,
    },
}

/// Lowercase, dash-separated form of a name that Discord accepts in a
/// channel name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Channel name for a new ticket, based on the in-game nickname when one was
/// given and the Discord username otherwise.
#[must_use]
pub fn channel_name(user_name: &str, game_nick: Option<&str>) -> String {
    let base = game_nick
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(user_name));
    let base = if base.is_empty() { "user".to_string() } else { base };
    truncate_chars(&format!("ticket-{base}"), MAX_CHANNEL_NAME)
}

/// Channel name after a staff member claims the ticket.
#[must_use]
pub fn claimed_channel_name(current: &str, staff_name: &str) -> String {
    let staff = slugify(staff_name);
    if staff.is_empty() || current.ends_with(&format!("-{staff}")) {
        return current.to_string();
    }
    truncate_chars(&format!("{current}-{staff}"), MAX_CHANNEL_NAME)
}

/// Cuts `text` to at most `max` characters.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Embed field value that is never empty and fits Discord's limit.
#[must_use]
pub fn field_value(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    truncate_chars(trimmed, MAX_FIELD_LEN)
}

fn permission_overwrites(
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    guild: &GuildConfig,
) -> Vec<serenity::PermissionOverwrite> {
    let member_allow = serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::READ_MESSAGE_HISTORY
        | serenity::Permissions::ATTACH_FILES;

    // The @everyone role shares the guild's id
    let mut overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: member_allow,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(user_id),
        },
    ];

    for role_id in [guild.admin_role_id, guild.mod_role_id].into_iter().flatten() {
        overwrites.push(serenity::PermissionOverwrite {
            allow: member_allow | serenity::Permissions::MANAGE_MESSAGES,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(role_id)),
        });
    }

    overwrites
}

/// Claim / transcript / close buttons shown in every ticket channel.
#[must_use]
pub fn ticket_controls() -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new("ticket_claim")
            .label("Claim")
            .emoji('✋')
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new("ticket_transcript")
            .label("Transcript")
            .emoji('📄')
            .style(serenity::ButtonStyle::Secondary),
        serenity::CreateButton::new("ticket_close")
            .label("Close")
            .emoji('🔒')
            .style(serenity::ButtonStyle::Danger),
    ])
}

fn welcome_message(
    ticket: &ticket::Model,
    user: &serenity::User,
    data: &BotData,
) -> serenity::CreateMessage {
    let brand = &data.settings.brand;
    let category = ticket.category;

    let embed = serenity::CreateEmbed::new()
        .title(format!("🎫 {}", ticket.id))
        .description(format!(
            "Hi <@{}>! Thanks for contacting **{brand}** support.\n\
             A staff member will be with you shortly.",
            user.id
        ))
        .color(TICKET_COLOR)
        .field(
            "📋 Category",
            format!("{} {}", category.emoji(), category.label()),
            true,
        )
        .field(
            "🎮 Nickname",
            ticket.game_nick.as_deref().unwrap_or("Not provided"),
            true,
        )
        .field("📝 Description", field_value(&ticket.description), false)
        .thumbnail(user.face())
        .footer(serenity::CreateEmbedFooter::new(format!("{brand} Support")))
        .timestamp(serenity::Timestamp::now());

    let mut mentions = format!("<@{}>", user.id);
    for role_id in [data.guild.admin_role_id, data.guild.mod_role_id]
        .into_iter()
        .flatten()
    {
        mentions.push_str(&format!(" <@&{role_id}>"));
    }

    serenity::CreateMessage::new()
        .content(mentions)
        .embed(embed)
        .components(vec![ticket_controls()])
}

/// Opens a ticket: creates the private channel, records the ticket and posts
/// the welcome message. If recording fails the channel is removed again.
pub async fn open_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    request: TicketRequest,
) -> Result<OpenOutcome> {
    let requester_id = user.id.to_string();
    if let Some(existing) = data.desk.open_ticket_for(&requester_id).await? {
        info!(ticket_id = %existing.id, user = %user.name, "User already has an open ticket");
        return Ok(OpenOutcome::AlreadyOpen(existing));
    }

    let mut builder =
        serenity::CreateChannel::new(channel_name(&user.name, request.game_nick.as_deref()))
            .kind(serenity::ChannelType::Text)
            .topic(format!(
                "{} {} ticket for {}",
                request.category.emoji(),
                request.category.label(),
                user.name
            ))
            .permissions(permission_overwrites(guild_id, user.id, &data.guild));
    if let Some(category_id) = data.guild.ticket_category_id {
        builder = builder.category(serenity::ChannelId::new(category_id));
    }

    let channel = guild_id.create_channel(ctx, builder).await?;

    let mut new_ticket = NewTicket::new(
        requester_id,
        user.name.clone(),
        request.category,
        request.description,
    )
    .with_channel(channel.id.to_string());
    if let Some(nick) = request.game_nick.filter(|n| !n.trim().is_empty()) {
        new_ticket = new_ticket.with_game_nick(nick.trim());
    }

    let ticket = match data.desk.create_ticket(new_ticket).await {
        Ok(ticket) => ticket,
        Err(e) => {
            if let Err(delete_err) = channel.id.delete(ctx).await {
                error!("Failed to remove channel {} after error: {}", channel.id, delete_err);
            }
            return Err(e);
        }
    };

    channel
        .id
        .send_message(ctx, welcome_message(&ticket, user, data))
        .await?;

    let log_embed = serenity::CreateEmbed::new()
        .title("🎫 Ticket opened")
        .color(TICKET_COLOR)
        .field("Ticket", &ticket.id, true)
        .field("User", format!("<@{}>", user.id), true)
        .field(
            "Category",
            format!("{} {}", ticket.category.emoji(), ticket.category.label()),
            true,
        )
        .field("Channel", format!("<#{}>", channel.id), true)
        .timestamp(serenity::Timestamp::now());
    log_to_channel(ctx, data, log_embed).await;

    Ok(OpenOutcome::Created {
        ticket,
        channel_id: channel.id,
    })
}

/// Embed posted in the channel when a ticket is closed.
#[must_use]
pub fn closed_embed(ticket: &ticket::Model, data: &BotData) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("🔒 Ticket closed")
        .description(format!(
            "Closed by **{}**. This channel will be deleted in {} seconds.",
            ticket.closed_by.as_deref().unwrap_or("unknown"),
            data.settings.close_delay_secs
        ))
        .color(CLOSED_COLOR)
        .timestamp(serenity::Timestamp::now());

    if let Some(rating) = ticket.rating {
        embed = embed.field(
            "Rating",
            "⭐".repeat(usize::try_from(rating).unwrap_or(0)),
            true,
        );
    }
    if let Some(feedback) = ticket.feedback.as_deref() {
        embed = embed.field("Feedback", field_value(feedback), false);
    }
    embed
}

/// Message text for a ticket that was closed in the meantime.
pub const ALREADY_CLOSED: &str = "This ticket is already closed.";

/// Replaces a stale rating prompt once the ticket turns out to be closed.
#[must_use]
pub fn already_closed_update() -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::UpdateMessage(
        serenity::CreateInteractionResponseMessage::new()
            .content(ALREADY_CLOSED)
            .embeds(vec![])
            .components(vec![]),
    )
}

/// Log-channel entry for a closed ticket.
#[must_use]
pub fn close_log_embed(ticket: &ticket::Model, closer_id: serenity::UserId) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("🔒 Ticket closed")
        .color(CLOSED_COLOR)
        .field("Ticket", &ticket.id, true)
        .field("Requester", format!("<@{}>", ticket.requester_id), true)
        .field("Closed by", format!("<@{closer_id}>"), true)
        .timestamp(serenity::Timestamp::now());
    if let Some(claim) = ticket.claimed_by() {
        embed = embed.field("Handled by", claim.staff_name, true);
    }
    if let Some(rating) = ticket.rating {
        embed = embed.field("Rating", format!("{rating}/5"), true);
    }
    if let Some(feedback) = ticket.feedback.as_deref() {
        embed = embed.field("Feedback", field_value(feedback), false);
    }
    embed
}

/// Closes a ticket in the store, logs it and schedules the channel for
/// deletion. Returns the stored ticket and the embed to show the user, or
/// `None` when someone else closed the ticket first; then nothing is logged
/// or scheduled and the given rating was not recorded.
pub async fn finish_close(
    ctx: &serenity::Context,
    data: &BotData,
    ticket_id: &str,
    closer: &serenity::User,
    rating: Option<i32>,
    feedback: Option<String>,
) -> Result<Option<(ticket::Model, serenity::CreateEmbed)>> {
    let ticket = match data
        .desk
        .try_close_ticket(ticket_id, &closer.name, rating, feedback)
        .await?
    {
        CloseOutcome::Closed(ticket) => ticket,
        CloseOutcome::AlreadyClosed(ticket) => {
            info!(ticket_id = %ticket.id, user = %closer.name, "Close request for a closed ticket");
            return Ok(None);
        }
    };

    log_to_channel(ctx, data, close_log_embed(&ticket, closer.id)).await;

    if let Some(channel_id) = ticket
        .channel_id
        .as_deref()
        .and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id != 0)
    {
        schedule_channel_deletion(
            Arc::clone(&ctx.http),
            serenity::ChannelId::new(channel_id),
            data.settings.close_delay_secs,
        );
    }

    let embed = closed_embed(&ticket, data);
    Ok(Some((ticket, embed)))
}

/// Deletes a channel after `delay_secs`. Failures are logged and dropped.
pub fn schedule_channel_deletion(
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    delay_secs: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        match channel_id.delete(&http).await {
            Ok(_) => info!("Deleted ticket channel {}", channel_id),
            Err(e) => error!("Failed to delete ticket channel {}: {}", channel_id, e),
        }
    });
}

/// Posts an embed to the configured log channel, if any.
pub async fn log_to_channel(ctx: &serenity::Context, data: &BotData, embed: serenity::CreateEmbed) {
    let Some(channel_id) = data.guild.ticket_logs_channel_id else {
        return;
    };

    if let Err(e) = serenity::ChannelId::new(channel_id)
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await
    {
        warn!("Failed to write to ticket log channel {}: {}", channel_id, e);
    }
}
