//! Staff dashboard - ticket totals, staff ranking and category breakdown.
//!
//! The embed builders here are shared by the `/dashboard` command and the
//! dashboard navigation buttons.

use crate::{
    core::dashboard::{
        DashboardStats, category_display, format_bar, percent, rating_stars, sorted_categories,
        top_rated_staff,
    },
    entities::TicketStatus,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use std::fmt::Write;

const DASHBOARD_COLOR: u32 = 0x0058_65F2;
const BAR_LENGTH: usize = 10;
const RECENT_SHOWN: usize = 5;
const STAFF_SHOWN: usize = 10;

/// Which dashboard page is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardView {
    /// Totals, satisfaction and recent tickets
    General,
    /// Staff ranking
    Staff,
    /// Tickets per category
    Categories,
}

impl DashboardView {
    /// Button id that opens this page.
    #[must_use]
    pub const fn custom_id(self) -> &'static str {
        match self {
            Self::General => "dashboard_general",
            Self::Staff => "dashboard_staff",
            Self::Categories => "dashboard_categories",
        }
    }

    /// Page for a navigation button id. Refresh goes back to the general page.
    #[must_use]
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            "dashboard_general" | "dashboard_refresh" => Some(Self::General),
            "dashboard_staff" => Some(Self::Staff),
            "dashboard_categories" => Some(Self::Categories),
            _ => None,
        }
    }
}

const fn status_icon(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "🟢",
        TicketStatus::Claimed => "🟡",
        TicketStatus::Closed => "🔴",
    }
}

/// Navigation buttons under every dashboard page.
#[must_use]
pub fn navigation(active: DashboardView) -> serenity::CreateActionRow {
    let button = |view: DashboardView, label: &str, emoji: char| {
        let style = if view == active {
            serenity::ButtonStyle::Primary
        } else {
            serenity::ButtonStyle::Secondary
        };
        serenity::CreateButton::new(view.custom_id())
            .label(label)
            .emoji(emoji)
            .style(style)
    };

    serenity::CreateActionRow::Buttons(vec![
        button(DashboardView::General, "General", '📊'),
        button(DashboardView::Staff, "Staff", '👥'),
        button(DashboardView::Categories, "Categories", '📂'),
        serenity::CreateButton::new("dashboard_refresh")
            .label("Refresh")
            .emoji('🔄')
            .style(serenity::ButtonStyle::Success),
    ])
}

/// Builds the embed for a dashboard page.
pub fn render(
    view: DashboardView,
    stats: &DashboardStats,
    brand: &str,
) -> Result<serenity::CreateEmbed> {
    let embed = match view {
        DashboardView::General => general_embed(stats, brand)?,
        DashboardView::Staff => staff_embed(stats, brand)?,
        DashboardView::Categories => categories_embed(stats, brand)?,
    };
    Ok(embed
        .color(DASHBOARD_COLOR)
        .footer(serenity::CreateEmbedFooter::new(format!("{brand} Support")))
        .timestamp(serenity::Timestamp::now()))
}

/// Status distribution lines, one bar per status.
pub fn status_breakdown(stats: &DashboardStats) -> Result<String> {
    let current = (stats.open + stats.claimed + stats.closed) as u64;
    let mut out = String::new();
    for (label, count) in [
        ("Open   ", stats.open),
        ("Claimed", stats.claimed),
        ("Closed ", stats.closed),
    ] {
        let count = count as u64;
        writeln!(
            out,
            "{label} {} {count} ({}%)",
            format_bar(count, current, BAR_LENGTH),
            percent(count, current)
        )?;
    }
    Ok(out)
}

fn general_embed(stats: &DashboardStats, brand: &str) -> Result<serenity::CreateEmbed> {
    let mut recent = String::new();
    for ticket in stats.recent_tickets.iter().take(RECENT_SHOWN) {
        writeln!(
            recent,
            "{} `{}` {} <@{}>",
            status_icon(ticket.status),
            ticket.id,
            ticket.category.emoji(),
            ticket.requester_id
        )?;
    }
    if recent.is_empty() {
        recent.push_str("No tickets yet");
    }

    Ok(serenity::CreateEmbed::new()
        .title(format!("📊 {brand} Support Dashboard"))
        .field(
            "🎫 Tickets",
            format!(
                "Total: **{}**\nOpen: **{}**\nClaimed: **{}**\nClosed: **{}**",
                stats.total, stats.open, stats.claimed, stats.closed
            ),
            true,
        )
        .field(
            "⭐ Satisfaction",
            format!(
                "{} **{:.1}/5**\n{} rating(s)",
                rating_stars(stats.average_rating),
                stats.average_rating,
                stats.total_ratings
            ),
            true,
        )
        .field(
            "⏱️ Last 24h",
            format!(
                "Opened: **{}**\nClosed: **{}**\nAvg. response: **{}h**",
                stats.created_last_24h, stats.closed_last_24h, stats.average_response_time
            ),
            true,
        )
        .field(
            "📈 Status",
            format!("```\n{}```", status_breakdown(stats)?),
            false,
        )
        .field("🕐 Recent tickets", recent, false))
}

fn staff_embed(stats: &DashboardStats, brand: &str) -> Result<serenity::CreateEmbed> {
    let mut ranking: Vec<_> = stats.staff_stats.values().collect();
    ranking.sort_by(|a, b| {
        b.tickets_closed
            .cmp(&a.tickets_closed)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut lines = String::new();
    for (position, staff) in ranking.iter().take(STAFF_SHOWN).enumerate() {
        let rating = if staff.rating_count == 0 {
            "no ratings".to_string()
        } else {
            format!(
                "{} {:.1} ({})",
                rating_stars(staff.average_rating),
                staff.average_rating,
                staff.rating_count
            )
        };
        writeln!(
            lines,
            "**{}.** {} - {} closed | {rating}",
            position + 1,
            staff.name,
            staff.tickets_closed
        )?;
    }
    if lines.is_empty() {
        lines.push_str("No staff activity yet");
    }

    let top = top_rated_staff(&stats.staff_stats).map_or_else(
        || "Nobody has been rated yet".to_string(),
        |staff| format!("🏆 **{}** with {:.1}/5", staff.name, staff.average_rating),
    );

    Ok(serenity::CreateEmbed::new()
        .title(format!("👥 {brand} Staff Ranking"))
        .field("Tickets closed", lines, false)
        .field("Top rated", top, false))
}

fn categories_embed(stats: &DashboardStats, brand: &str) -> Result<serenity::CreateEmbed> {
    let sorted = sorted_categories(&stats.category_stats);
    let total: u64 = sorted.iter().map(|(_, count)| count).sum();
    let max = sorted.first().map_or(0, |(_, count)| *count);

    let mut lines = String::new();
    for (key, count) in &sorted {
        let (emoji, name) = category_display(key);
        writeln!(
            lines,
            "{emoji} **{name}**\n`{}` {count} ({}%)",
            format_bar(*count, max, BAR_LENGTH),
            percent(*count, total)
        )?;
    }
    if lines.is_empty() {
        lines.push_str("No tickets yet");
    }

    Ok(serenity::CreateEmbed::new()
        .title(format!("📂 {brand} Tickets by Category"))
        .description(lines))
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{DashboardView, navigation, render};
    use crate::{
        bot::{Context, is_staff},
        errors::Result,
    };

    async fn show(ctx: Context<'_>, view: DashboardView) -> Result<()> {
        let member = ctx.author_member().await;
        if !is_staff(member.as_deref(), &ctx.data().guild) {
            ctx.send(
                poise::CreateReply::default()
                    .content("❌ Only staff can view the dashboard.")
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }

        let stats = ctx.data().desk.snapshot().await?;
        let embed = render(view, &stats, &ctx.data().settings.brand)?;
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![navigation(view)]),
        )
        .await?;
        Ok(())
    }

    /// Support statistics for staff.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("general", "staff", "categories"),
        subcommand_required
    )]
    pub async fn dashboard(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Ticket totals, satisfaction and recent tickets.
    #[poise::command(slash_command, guild_only)]
    pub async fn general(ctx: Context<'_>) -> Result<()> {
        show(ctx, DashboardView::General).await
    }

    /// Staff ranking by tickets closed and rating.
    #[poise::command(slash_command, guild_only)]
    pub async fn staff(ctx: Context<'_>) -> Result<()> {
        show(ctx, DashboardView::Staff).await
    }

    /// Tickets per category.
    #[poise::command(slash_command, guild_only)]
    pub async fn categories(ctx: Context<'_>) -> Result<()> {
        show(ctx, DashboardView::Categories).await
    }
}

pub use inner::*;
