//! Ticket and feedback forms.

use crate::{
    bot::{
        BotData,
        handlers::tickets::{self, OpenOutcome, TicketRequest},
    },
    entities::TicketCategory,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, error};

const NICKNAME_INPUT: &str = "nickname_input";
const CATEGORY_INPUT: &str = "category_input";
const DESCRIPTION_INPUT: &str = "description_input";
const FEEDBACK_INPUT: &str = "feedback_input";
const FEEDBACK_PREFIX: &str = "feedback_modal_";

/// Form shown by the "open ticket" button.
#[must_use]
pub fn ticket_modal() -> serenity::CreateModal {
    serenity::CreateModal::new("ticket_modal", "Open a support ticket").components(vec![
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "In-game nickname",
                NICKNAME_INPUT,
            )
            .placeholder("Steve")
            .max_length(32)
            .required(true),
        ),
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "Category",
                CATEGORY_INPUT,
            )
            .placeholder("bug, question, economy, report, suggestion, other")
            .max_length(32)
            .required(true),
        ),
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Paragraph,
                "Describe your issue",
                DESCRIPTION_INPUT,
            )
            .placeholder("Tell us what happened")
            .max_length(1000)
            .required(true),
        ),
    ])
}

/// Optional feedback form shown after the owner picks a rating.
#[must_use]
pub fn feedback_modal(rating: i32) -> serenity::CreateModal {
    serenity::CreateModal::new(
        format!("{FEEDBACK_PREFIX}{rating}"),
        format!("Feedback ({rating}/5)"),
    )
    .components(vec![serenity::CreateActionRow::InputText(
        serenity::CreateInputText::new(
            serenity::InputTextStyle::Paragraph,
            "Anything you want to tell us? (optional)",
            FEEDBACK_INPUT,
        )
        .max_length(1000)
        .required(false),
    )])
}

/// Category typed into the ticket form. Unrecognized text files the ticket
/// under Other.
#[must_use]
pub fn category_from_form(text: Option<&str>) -> TicketCategory {
    text.and_then(|t| t.parse().ok())
        .unwrap_or(TicketCategory::Other)
}

/// Rating encoded in a feedback form id.
#[must_use]
pub fn rating_from_custom_id(custom_id: &str) -> Option<i32> {
    custom_id.strip_prefix(FEEDBACK_PREFIX)?.parse().ok()
}

/// Non-empty value of a text input in a submitted form.
fn input_value(modal: &serenity::ModalInteraction, custom_id: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Routes a submitted form by its custom id. Failures are logged and reported
/// to the user as an ephemeral message.
pub async fn handle_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &BotData,
) -> Result<()> {
    let custom_id = modal.data.custom_id.as_str();
    debug!(custom_id, user = %modal.user.name, "Modal submitted");

    let result = if custom_id == "ticket_modal" {
        create_ticket(ctx, modal, data).await
    } else if let Some(rating) = rating_from_custom_id(custom_id) {
        submit_feedback(ctx, modal, data, rating).await
    } else {
        debug!(custom_id, "Ignoring unknown modal");
        Ok(())
    };

    if let Err(e) = result {
        error!("Error handling modal `{}`: {:?}", custom_id, e);
        report_failure(ctx, modal, &e).await;
    }
    Ok(())
}

async fn report_failure(ctx: &serenity::Context, modal: &serenity::ModalInteraction, error: &Error) {
    let content = format!("❌ An error occurred: {error}");
    let response = serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content.clone())
            .ephemeral(true),
    );
    if modal.create_response(ctx, response).await.is_ok() {
        return;
    }

    let followup = serenity::CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true);
    if let Err(e) = modal.create_followup(ctx, followup).await {
        error!("Failed to report modal error: {}", e);
    }
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    content: &str,
) -> Result<()> {
    modal
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

async fn create_ticket(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(guild_id) = modal.guild_id else {
        return reply_ephemeral(ctx, modal, "❌ Tickets can only be opened in a server.").await;
    };

    // Channel creation can take longer than the 3s response window
    modal.defer_ephemeral(ctx).await?;

    let request = TicketRequest {
        category: category_from_form(input_value(modal, CATEGORY_INPUT).as_deref()),
        description: input_value(modal, DESCRIPTION_INPUT).unwrap_or_default(),
        game_nick: input_value(modal, NICKNAME_INPUT),
    };

    let content = match tickets::open_ticket(ctx, data, guild_id, &modal.user, request).await? {
        OpenOutcome::AlreadyOpen(existing) => existing.channel_id.map_or_else(
            || format!("❌ You already have an open ticket ({}).", existing.id),
            |channel_id| format!("❌ You already have an open ticket: <#{channel_id}>"),
        ),
        OpenOutcome::Created { channel_id, .. } => {
            format!("✅ Your ticket has been created: <#{channel_id}>")
        }
    };

    modal
        .edit_response(ctx, serenity::EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

async fn submit_feedback(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &BotData,
    rating: i32,
) -> Result<()> {
    let Some(ticket) = data
        .desk
        .get_by_channel(&modal.channel_id.to_string())
        .await?
    else {
        return reply_ephemeral(ctx, modal, "❌ No ticket is linked to this channel.").await;
    };
    if ticket.requester_id != modal.user.id.to_string() {
        return reply_ephemeral(ctx, modal, "❌ Only the ticket owner can rate it.").await;
    }

    if ticket.is_closed() {
        modal
            .create_response(ctx, tickets::already_closed_update())
            .await?;
        return Ok(());
    }

    let feedback = input_value(modal, FEEDBACK_INPUT);
    let closed =
        tickets::finish_close(ctx, data, &ticket.id, &modal.user, Some(rating), feedback).await?;
    let Some((_, embed)) = closed else {
        modal
            .create_response(ctx, tickets::already_closed_update())
            .await?;
        return Ok(());
    };

    modal
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
