//! Dashboard snapshot and display helpers.
//!
//! [`DashboardStats`] combines the stored statistics document with a live
//! scan of the ticket log. Status counts and response time are always
//! recomputed from the log so they stay correct even if a ticket's status was
//! changed outside the normal flow. The formatting helpers are
//! framework-agnostic; the bot layer turns their output into embeds.

use crate::{
    core::stats::{StaffStats, TicketStats},
    entities::{TicketCategory, TicketStatus, ticket},
};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Point-in-time dashboard data.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    /// Tickets ever created (stored counter)
    pub total: u64,
    /// Tickets currently open (live)
    pub open: usize,
    /// Tickets currently claimed (live)
    pub claimed: usize,
    /// Tickets currently closed (live)
    pub closed: usize,
    /// Average rating rounded to one decimal
    pub average_rating: f64,
    /// Number of ratings received
    pub total_ratings: u64,
    /// Mean open-to-close time of tickets closed in the last 24h, in whole hours
    pub average_response_time: i64,
    /// Per-staff aggregates
    pub staff_stats: BTreeMap<String, StaffStats>,
    /// Ticket count per category
    pub category_stats: BTreeMap<String, u64>,
    /// Most recent tickets, newest first
    pub recent_tickets: Vec<ticket::Model>,
    /// Tickets opened in the last 24h
    pub created_last_24h: usize,
    /// Tickets closed in the last 24h
    pub closed_last_24h: usize,
}

impl DashboardStats {
    /// Builds a snapshot from the stored document and the full ticket log.
    #[must_use]
    pub fn compute(
        stats: &TicketStats,
        tickets: &[ticket::Model],
        now: DateTime<Utc>,
        recent_count: usize,
    ) -> Self {
        let count_status = |status: TicketStatus| tickets.iter().filter(|t| t.status == status).count();
        let since = now - Duration::hours(24);

        let recently_closed: Vec<&ticket::Model> = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Closed)
            .filter(|t| t.closed_at.is_some_and(|closed_at| closed_at > since))
            .collect();

        let response_millis: Vec<i64> = recently_closed
            .iter()
            .filter_map(|t| t.closed_at.map(|closed_at| (closed_at - t.created_at).num_milliseconds()))
            .collect();

        Self {
            total: stats.total_tickets,
            open: count_status(TicketStatus::Open),
            claimed: count_status(TicketStatus::Claimed),
            closed: count_status(TicketStatus::Closed),
            average_rating: round_one_decimal(stats.average_rating()),
            total_ratings: stats.total_ratings,
            average_response_time: millis_to_hours(average_millis(&response_millis)),
            staff_stats: stats.staff_stats.clone(),
            category_stats: stats.category_stats.clone(),
            recent_tickets: tickets.iter().rev().take(recent_count).cloned().collect(),
            created_last_24h: tickets.iter().filter(|t| t.created_at > since).count(),
            closed_last_24h: recently_closed.len(),
        }
    }
}

#[allow(clippy::cast_precision_loss)] // millisecond sums stay well inside f64 precision
fn average_millis(samples: &[i64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<i64>() as f64 / samples.len() as f64
}

#[allow(clippy::cast_possible_truncation)] // already rounded to whole hours
fn millis_to_hours(millis: f64) -> i64 {
    (millis / 3_600_000.0).round() as i64
}

/// Rounds to one decimal place for display.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of `value` in `total` as a whole percentage, 0 when `total` is 0.
#[must_use]
pub fn percent(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    // Cast safety: ratio is in [0, 100] for value <= total
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let rounded = ((value as f64 / total as f64) * 100.0).round() as u64;
    rounded
}

/// Text bar like `█████░░░░░` showing `value` out of `max`.
#[must_use]
pub fn format_bar(value: u64, max: u64, length: usize) -> String {
    let ratio = if max == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let ratio = (value as f64 / max as f64).clamp(0.0, 1.0);
        ratio
    };

    // Cast safety: ratio is in [0, 1] and length is small
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = (ratio * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Star string for an average rating: one star per whole point plus one more
/// when the fraction is at least .5.
#[must_use]
pub fn rating_stars(rating: f64) -> String {
    let rating = rating.clamp(0.0, 5.0);
    // Cast safety: rating is clamped to [0, 5]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = rating.floor() as usize;
    let extra = usize::from(rating.fract() >= 0.5);
    "⭐".repeat(whole + extra)
}

/// Staff member with the highest average rating. Ties keep the first in key
/// order; staff without ratings are never picked.
#[must_use]
pub fn top_rated_staff(staff: &BTreeMap<String, StaffStats>) -> Option<&StaffStats> {
    staff
        .values()
        .filter(|s| s.average_rating > 0.0)
        .fold(None, |best: Option<&StaffStats>, s| match best {
            Some(b) if b.average_rating >= s.average_rating => Some(b),
            _ => Some(s),
        })
}

/// Categories sorted by count, largest first; ties by name.
#[must_use]
pub fn sorted_categories(categories: &BTreeMap<String, u64>) -> Vec<(&str, u64)> {
    let mut sorted: Vec<(&str, u64)> = categories
        .iter()
        .map(|(name, count)| (name.as_str(), *count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

/// Emoji and display name for a stored category key. Keys that are not a
/// known category (older free-text entries) get a generic emoji and are
/// capitalized.
#[must_use]
pub fn category_display(key: &str) -> (&'static str, String) {
    key.parse::<TicketCategory>().map_or_else(
        |_| {
            let mut chars = key.chars();
            let name = chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            });
            ("📋", name)
        },
        |category| (category.emoji(), category.label().to_string()),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn staff(name: &str, average_rating: f64) -> StaffStats {
        StaffStats {
            name: name.to_string(),
            average_rating,
            ..StaffStats::default()
        }
    }

    #[test]
    fn test_compute_empty() {
        let snapshot = DashboardStats::compute(&TicketStats::default(), &[], Utc::now(), 10);

        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.open, 0);
        assert_eq!(snapshot.claimed, 0);
        assert_eq!(snapshot.closed, 0);
        assert_eq!(snapshot.average_rating, 0.0);
        assert_eq!(snapshot.total_ratings, 0);
        assert_eq!(snapshot.average_response_time, 0);
        assert!(snapshot.recent_tickets.is_empty());
    }

    #[test]
    fn test_compute_status_counts_come_from_log() {
        let now = Utc::now();
        let mut claimed = ticket_model("b", "2", TicketCategory::Bug, now);
        claimed.status = TicketStatus::Claimed;
        let tickets = vec![ticket_model("a", "1", TicketCategory::Bug, now), claimed];

        // Counters say nothing was ever created; status counts still reflect the log
        let snapshot = DashboardStats::compute(&TicketStats::default(), &tickets, now, 10);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.open, 1);
        assert_eq!(snapshot.claimed, 1);
        assert_eq!(snapshot.closed, 0);
    }

    #[test]
    fn test_compute_response_time_uses_last_24h_only() {
        let now = Utc::now();
        let mut recent = ticket_model("a", "1", TicketCategory::Bug, now - Duration::hours(5));
        recent.status = TicketStatus::Closed;
        recent.closed_at = Some(now - Duration::hours(1));

        let mut recent_fast = ticket_model("b", "2", TicketCategory::Bug, now - Duration::hours(3));
        recent_fast.status = TicketStatus::Closed;
        recent_fast.closed_at = Some(now - Duration::hours(1));

        let mut old = ticket_model("c", "3", TicketCategory::Bug, now - Duration::days(10));
        old.status = TicketStatus::Closed;
        old.closed_at = Some(now - Duration::days(2));

        let snapshot =
            DashboardStats::compute(&TicketStats::default(), &[old, recent, recent_fast], now, 10);

        // (4h + 2h) / 2
        assert_eq!(snapshot.average_response_time, 3);
        assert_eq!(snapshot.closed_last_24h, 2);
        assert_eq!(snapshot.created_last_24h, 2);
    }

    #[test]
    fn test_compute_rounds_average_rating() {
        let stats = TicketStats {
            total_ratings: 3,
            rating_sum: 13,
            average_rating: 13.0 / 3.0,
            ..TicketStats::default()
        };
        let snapshot = DashboardStats::compute(&stats, &[], Utc::now(), 10);
        assert_eq!(snapshot.average_rating, 4.3);
        assert_eq!(snapshot.total_ratings, 3);
    }

    #[test]
    fn test_compute_recent_tickets_newest_first() {
        let now = Utc::now();
        let tickets: Vec<ticket::Model> = (0..12)
            .map(|i| {
                ticket_model(
                    &format!("t{i:02}"),
                    "1",
                    TicketCategory::Other,
                    now + Duration::seconds(i),
                )
            })
            .collect();

        let snapshot = DashboardStats::compute(&TicketStats::default(), &tickets, now, 10);
        assert_eq!(snapshot.recent_tickets.len(), 10);
        assert_eq!(snapshot.recent_tickets[0].id, "t11");
        assert_eq!(snapshot.recent_tickets[9].id, "t02");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(5, 10, 10), "█████░░░░░");
        assert_eq!(format_bar(0, 10, 10), "░░░░░░░░░░");
        assert_eq!(format_bar(10, 10, 10), "██████████");
        assert_eq!(format_bar(3, 0, 4), "░░░░");
        assert_eq!(format_bar(20, 10, 4), "████");
    }

    #[test]
    fn test_rating_stars() {
        assert_eq!(rating_stars(0.0), "");
        assert_eq!(rating_stars(4.0), "⭐⭐⭐⭐");
        assert_eq!(rating_stars(3.5), "⭐⭐⭐⭐");
        assert_eq!(rating_stars(3.4), "⭐⭐⭐");
        assert_eq!(rating_stars(9.0), "⭐⭐⭐⭐⭐");
    }

    #[test]
    fn test_top_rated_staff() {
        let mut map = BTreeMap::new();
        assert!(top_rated_staff(&map).is_none());

        map.insert("1".to_string(), staff("Ana", 4.5));
        map.insert("2".to_string(), staff("Bia", 4.8));
        map.insert("3".to_string(), staff("Caio", 4.8));
        map.insert("4".to_string(), staff("Duda", 0.0));

        assert_eq!(top_rated_staff(&map).unwrap().name, "Bia");
    }

    #[test]
    fn test_sorted_categories() {
        let map = BTreeMap::from([
            ("question".to_string(), 1),
            ("bug".to_string(), 2),
            ("economy".to_string(), 2),
        ]);
        assert_eq!(
            sorted_categories(&map),
            vec![("bug", 2), ("economy", 2), ("question", 1)]
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(category_display("bug"), ("🐛", "Bug/Problem".to_string()));
        assert_eq!(category_display("duvida"), ("❓", "Question".to_string()));
        assert_eq!(category_display("lag"), ("📋", "Lag".to_string()));
    }
}
