//! Button and select-menu handlers for ticket channels and the dashboard.

use crate::{
    bot::{
        BotData,
        commands::dashboard::{DashboardView, navigation, render},
        handlers::{
            modals,
            tickets::{self, CLAIM_COLOR},
        },
        is_staff,
    },
    core::transcript::{TranscriptLine, render_transcript, transcript_file_name},
    entities::ticket,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

/// Short caption for each rating option.
#[must_use]
pub const fn rating_caption(rating: usize) -> &'static str {
    match rating {
        5 => "Excellent",
        4 => "Good",
        3 => "Okay",
        2 => "Poor",
        _ => "Very poor",
    }
}

/// Routes a component interaction by its custom id. Failures are logged and
/// reported to the user as an ephemeral message.
pub async fn handle_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let custom_id = component.data.custom_id.as_str();
    debug!(custom_id, user = %component.user.name, "Component interaction");

    let result = match custom_id {
        "create_ticket_button" => {
            component
                .create_response(ctx, serenity::CreateInteractionResponse::Modal(modals::ticket_modal()))
                .await
                .map_err(Error::from)
        }
        "ticket_claim" => claim(ctx, component, data).await,
        "ticket_transcript" => transcript(ctx, component, data).await,
        "ticket_close" => close(ctx, component, data).await,
        "ticket_rating" => rating_selected(ctx, component, data).await,
        "ticket_close_no_rating" => close_without_rating(ctx, component, data).await,
        other => match DashboardView::from_custom_id(other) {
            Some(view) => show_dashboard(ctx, component, data, view).await,
            None => {
                debug!(custom_id = other, "Ignoring unknown component");
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        error!("Error handling component `{}`: {:?}", custom_id, e);
        report_failure(ctx, component, &e).await;
    }
    Ok(())
}

async fn report_failure(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    error: &Error,
) {
    let content = format!("❌ An error occurred: {error}");
    let response = serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content.clone())
            .ephemeral(true),
    );
    if component.create_response(ctx, response).await.is_ok() {
        return;
    }

    // Already acknowledged, fall back to a followup
    let followup = serenity::CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true);
    if let Err(e) = component.create_followup(ctx, followup).await {
        error!("Failed to report component error: {}", e);
    }
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    content: &str,
) -> Result<()> {
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn channel_ticket(
    data: &BotData,
    channel_id: serenity::ChannelId,
) -> Result<Option<ticket::Model>> {
    data.desk.get_by_channel(&channel_id.to_string()).await
}

async fn rename_for_claim(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    staff_name: &str,
) {
    let current = match channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild().map(|c| c.name),
        Err(e) => {
            warn!("Failed to fetch channel {}: {}", channel_id, e);
            None
        }
    };
    let Some(current) = current else {
        return;
    };

    let new_name = tickets::claimed_channel_name(&current, staff_name);
    if new_name == current {
        return;
    }
    if let Err(e) = channel_id
        .edit(ctx, serenity::EditChannel::new().name(new_name))
        .await
    {
        warn!("Failed to rename channel {}: {}", channel_id, e);
    }
}

async fn claim(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    if !is_staff(component.member.as_ref(), &data.guild) {
        return reply_ephemeral(ctx, component, "❌ Only staff can claim tickets.").await;
    }
    let Some(ticket) = channel_ticket(data, component.channel_id).await? else {
        return reply_ephemeral(ctx, component, "❌ No ticket is linked to this channel.").await;
    };

    let staff = &component.user;
    let ticket = match data
        .desk
        .claim_ticket(&ticket.id, &staff.id.to_string(), &staff.name)
        .await
    {
        Ok(ticket) => ticket,
        Err(Error::TicketClosed { .. }) => {
            return reply_ephemeral(ctx, component, "❌ This ticket is already closed.").await;
        }
        Err(e) => return Err(e),
    };

    let embed = serenity::CreateEmbed::new()
        .title("✋ Ticket claimed")
        .description(format!(
            "<@{}> is now handling this ticket.",
            staff.id
        ))
        .color(CLAIM_COLOR)
        .timestamp(serenity::Timestamp::now());
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new().embed(embed),
            ),
        )
        .await?;

    rename_for_claim(ctx, component.channel_id, &staff.name).await;

    let log_embed = serenity::CreateEmbed::new()
        .title("✋ Ticket claimed")
        .color(CLAIM_COLOR)
        .field("Ticket", &ticket.id, true)
        .field("Staff", format!("<@{}>", staff.id), true)
        .timestamp(serenity::Timestamp::now());
    tickets::log_to_channel(ctx, data, log_embed).await;
    Ok(())
}

fn transcript_line(message: &serenity::Message) -> TranscriptLine {
    TranscriptLine {
        timestamp: DateTime::<Utc>::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
        author: message.author.name.clone(),
        content: message.content.clone(),
        attachments: message
            .attachments
            .iter()
            .map(|a| a.filename.clone())
            .collect(),
    }
}

async fn transcript(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(ticket) = channel_ticket(data, component.channel_id).await? else {
        return reply_ephemeral(ctx, component, "❌ No ticket is linked to this channel.").await;
    };
    if !is_staff(component.member.as_ref(), &data.guild) {
        return reply_ephemeral(ctx, component, "❌ Only staff can export transcripts.").await;
    }

    component.defer_ephemeral(ctx).await?;

    let messages = component
        .channel_id
        .messages(
            ctx,
            serenity::GetMessages::new().limit(data.settings.transcript_limit),
        )
        .await?;
    let lines: Vec<TranscriptLine> = messages.iter().map(transcript_line).collect();

    let channel_name = match component.channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild().map_or_else(|| ticket.id.clone(), |c| c.name),
        Err(_) => ticket.id.clone(),
    };
    let now = Utc::now();
    let text = render_transcript(&channel_name, &component.user.name, now, &lines)?;
    let file = serenity::CreateAttachment::bytes(
        text.into_bytes(),
        transcript_file_name(&channel_name, now),
    );

    component
        .edit_response(
            ctx,
            serenity::EditInteractionResponse::new()
                .content(format!("📄 Transcript of {} message(s).", lines.len()))
                .new_attachment(file),
        )
        .await?;

    info!(ticket_id = %ticket.id, messages = lines.len(), "Transcript generated");
    Ok(())
}

/// Rating select plus a skip button, shown to the ticket owner on close.
#[must_use]
pub fn rating_prompt() -> Vec<serenity::CreateActionRow> {
    let options = (1..=5usize)
        .rev()
        .map(|rating| {
            serenity::CreateSelectMenuOption::new(
                format!("{} {rating}/5", "⭐".repeat(rating)),
                rating.to_string(),
            )
            .description(rating_caption(rating))
        })
        .collect();

    vec![
        serenity::CreateActionRow::SelectMenu(
            serenity::CreateSelectMenu::new(
                "ticket_rating",
                serenity::CreateSelectMenuKind::String { options },
            )
            .placeholder("How was the support you received?"),
        ),
        serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new("ticket_close_no_rating")
                .label("Close without rating")
                .style(serenity::ButtonStyle::Secondary),
        ]),
    ]
}

async fn close(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(ticket) = channel_ticket(data, component.channel_id).await? else {
        return reply_ephemeral(ctx, component, "❌ No ticket is linked to this channel.").await;
    };
    if ticket.is_closed() {
        return reply_ephemeral(ctx, component, tickets::ALREADY_CLOSED).await;
    }

    let is_owner = ticket.requester_id == component.user.id.to_string();
    if !is_owner && !is_staff(component.member.as_ref(), &data.guild) {
        return reply_ephemeral(ctx, component, "❌ You cannot close this ticket.").await;
    }

    // The owner gets the chance to rate before the ticket is closed
    if is_owner {
        let embed = serenity::CreateEmbed::new()
            .title("⭐ Rate your support")
            .description("Before closing, please rate the help you received.")
            .color(tickets::TICKET_COLOR);
        return component
            .create_response(
                ctx,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(embed)
                        .components(rating_prompt()),
                ),
            )
            .await
            .map_err(Error::from);
    }

    let closed =
        tickets::finish_close(ctx, data, &ticket.id, &component.user, None, None).await?;
    let Some((_, embed)) = closed else {
        return reply_ephemeral(ctx, component, tickets::ALREADY_CLOSED).await;
    };
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new().embed(embed),
            ),
        )
        .await?;
    Ok(())
}

/// Ticket of this channel if the user is its owner and it is still open;
/// otherwise replies with an explanation and returns `None`.
async fn owned_ticket(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<Option<ticket::Model>> {
    let Some(ticket) = channel_ticket(data, component.channel_id).await? else {
        reply_ephemeral(ctx, component, "❌ No ticket is linked to this channel.").await?;
        return Ok(None);
    };
    if ticket.requester_id != component.user.id.to_string() {
        reply_ephemeral(ctx, component, "❌ Only the ticket owner can do this.").await?;
        return Ok(None);
    }
    if ticket.is_closed() {
        component
            .create_response(ctx, tickets::already_closed_update())
            .await?;
        return Ok(None);
    }
    Ok(Some(ticket))
}

async fn rating_selected(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    if owned_ticket(ctx, component, data).await?.is_none() {
        return Ok(());
    }

    let rating = match &component.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|value| value.parse::<i32>().ok())
        }
        _ => None,
    };
    let Some(rating) = rating else {
        return reply_ephemeral(ctx, component, "❌ Please pick a rating from the menu.").await;
    };

    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Modal(modals::feedback_modal(rating)),
        )
        .await?;
    Ok(())
}

async fn close_without_rating(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(ticket) = owned_ticket(ctx, component, data).await? else {
        return Ok(());
    };

    let closed =
        tickets::finish_close(ctx, data, &ticket.id, &component.user, None, None).await?;
    let Some((_, embed)) = closed else {
        component
            .create_response(ctx, tickets::already_closed_update())
            .await?;
        return Ok(());
    };
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(vec![]),
            ),
        )
        .await?;
    Ok(())
}

async fn show_dashboard(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
    view: DashboardView,
) -> Result<()> {
    if !is_staff(component.member.as_ref(), &data.guild) {
        return reply_ephemeral(ctx, component, "❌ Only staff can view the dashboard.").await;
    }

    let stats = data.desk.snapshot().await?;
    component
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(render(view, &stats, &data.settings.brand)?)
                    .components(vec![navigation(view)]),
            ),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_caption() {
        assert_eq!(rating_caption(5), "Excellent");
        assert_eq!(rating_caption(3), "Okay");
        assert_eq!(rating_caption(1), "Very poor");
    }

    #[test]
    fn test_rating_prompt_has_menu_and_skip() {
        assert_eq!(rating_prompt().len(), 2);
    }
}
