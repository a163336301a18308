//! Statistics aggregator - the derived summary of the ticket log.
//!
//! [`TicketStats`] is updated incrementally on every create and close, and
//! stored as a JSON document in the `system_state` table. It is a pure
//! function of the ticket log: [`TicketStats::rebuild`] replays the log and
//! produces the same document, which is also how a lost or corrupt document is
//! recovered.

use crate::{
    core::ticket as store,
    entities::{SystemState, system_state, ticket},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `system_state` key of the statistics document.
pub const STATS_KEY: &str = "ticket_stats";

/// Per-staff aggregate, keyed by staff user ID in [`TicketStats::staff_stats`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffStats {
    /// Name recorded when the staff member first closed a claimed ticket
    pub name: String,
    /// Claimed tickets that were closed
    pub tickets_closed: u64,
    /// Sum of ratings on those tickets
    pub total_rating: u64,
    /// Number of rated tickets
    pub rating_count: u64,
    /// `total_rating / rating_count`, 0 without ratings
    pub average_rating: f64,
}

/// Activity within one `YYYY-MM` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyStats {
    /// Tickets opened in the month
    pub created: u64,
    /// Tickets closed in the month
    pub closed: u64,
    /// Ratings received in the month, in close order
    pub ratings: Vec<i32>,
}

/// The statistics document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketStats {
    /// Tickets ever created
    pub total_tickets: u64,
    /// Close transitions recorded
    pub closed_tickets: u64,
    /// `rating_sum / total_ratings`, 0 without ratings
    pub average_rating: f64,
    /// Number of ratings received
    pub total_ratings: u64,
    /// Sum of all ratings
    pub rating_sum: u64,
    /// Aggregates per staff member ID
    pub staff_stats: BTreeMap<String, StaffStats>,
    /// Ticket count per category
    pub category_stats: BTreeMap<String, u64>,
    /// Activity per `YYYY-MM`
    pub monthly_stats: BTreeMap<String, MonthlyStats>,
}

/// `YYYY-MM` bucket of a timestamp.
#[must_use]
pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

#[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

impl TicketStats {
    /// Records a newly created ticket.
    pub fn on_ticket_created(&mut self, ticket: &ticket::Model) {
        self.total_tickets += 1;
        *self
            .category_stats
            .entry(ticket.category.as_str().to_string())
            .or_insert(0) += 1;
        self.monthly_stats
            .entry(month_key(ticket.created_at))
            .or_default()
            .created += 1;
    }

    /// Records a close transition. The month bucket is taken from `closed_at`.
    pub fn on_ticket_closed(&mut self, ticket: &ticket::Model) {
        let Some(closed_at) = ticket.closed_at else {
            tracing::warn!(ticket_id = %ticket.id, "Ignoring close event for ticket without closed_at");
            return;
        };

        self.closed_tickets += 1;
        let month = self.monthly_stats.entry(month_key(closed_at)).or_default();
        month.closed += 1;

        if let Some(rating) = ticket.rating {
            let points = u64::from(rating.unsigned_abs());
            self.total_ratings += 1;
            self.rating_sum += points;
            self.average_rating = mean(self.rating_sum, self.total_ratings);
            month.ratings.push(rating);
        }

        if let Some(claim) = ticket.claimed_by() {
            let staff = self
                .staff_stats
                .entry(claim.staff_id)
                .or_insert_with(|| StaffStats {
                    name: claim.staff_name,
                    ..StaffStats::default()
                });
            staff.tickets_closed += 1;

            if let Some(rating) = ticket.rating {
                staff.total_rating += u64::from(rating.unsigned_abs());
                staff.rating_count += 1;
                staff.average_rating = mean(staff.total_rating, staff.rating_count);
            }
        }
    }

    /// Replays the whole ticket log from an empty document: creations in
    /// `created_at` order, then closures in `closed_at` order.
    #[must_use]
    pub fn rebuild(tickets: &[ticket::Model]) -> Self {
        let mut stats = Self::default();

        let mut created: Vec<&ticket::Model> = tickets.iter().collect();
        created.sort_by_key(|t| t.created_at);
        for ticket in created {
            stats.on_ticket_created(ticket);
        }

        let mut closed: Vec<&ticket::Model> = tickets.iter().filter(|t| t.is_closed()).collect();
        closed.sort_by_key(|t| t.closed_at);
        for ticket in closed {
            stats.on_ticket_closed(ticket);
        }

        stats
    }

    /// Mean rating across all rated tickets, 0 without ratings.
    #[must_use]
    pub fn average_rating(&self) -> f64 {
        mean(self.rating_sum, self.total_ratings)
    }
}

/// Reads the statistics document.
///
/// # Returns
/// * `Ok(Some(stats))` - the stored document
/// * `Ok(None)` - no document stored yet
/// * `Err(Error::StatsDocument)` - the stored document does not parse
pub async fn load_stats<C>(conn: &C) -> Result<Option<TicketStats>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(STATS_KEY))
        .one(conn)
        .await?;

    match state {
        Some(s) => serde_json::from_str(&s.value).map(Some).map_err(Into::into),
        None => Ok(None),
    }
}

/// Writes the statistics document, replacing any previous version.
pub async fn save_stats<C>(conn: &C, stats: &TicketStats) -> Result<()>
where
    C: ConnectionTrait,
{
    let value = serde_json::to_string_pretty(stats)?;
    let now = Utc::now();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(STATS_KEY))
        .one(conn)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(conn).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(STATS_KEY.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(conn).await?;
    }

    Ok(())
}

/// Loads the statistics document, rebuilding it from the ticket log when it
/// is missing or corrupt. The second value tells whether a rebuild happened.
/// Nothing is written back; callers that hold the write guard persist it.
pub async fn load_or_rebuild<C>(conn: &C) -> Result<(TicketStats, bool)>
where
    C: ConnectionTrait,
{
    match load_stats(conn).await {
        Ok(Some(stats)) => Ok((stats, false)),
        Ok(None) => {
            tracing::debug!("No statistics document stored, rebuilding from ticket log");
            let tickets = store::get_all(conn).await?;
            Ok((TicketStats::rebuild(&tickets), true))
        }
        Err(Error::StatsDocument { message }) => {
            tracing::warn!("Statistics document is corrupt ({message}), rebuilding from ticket log");
            let tickets = store::get_all(conn).await?;
            Ok((TicketStats::rebuild(&tickets), true))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{TicketCategory, TicketStatus};
    use crate::test_utils::*;
    use chrono::{Duration, TimeZone};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn closed(
        mut ticket: ticket::Model,
        closed_at: DateTime<Utc>,
        rating: Option<i32>,
        staff: Option<(&str, &str)>,
    ) -> ticket::Model {
        if let Some((id, name)) = staff {
            ticket.claimed_by_id = Some(id.to_string());
            ticket.claimed_by_name = Some(name.to_string());
            ticket.claimed_at = Some(ticket.created_at);
        }
        ticket.status = TicketStatus::Closed;
        ticket.closed_at = Some(closed_at);
        ticket.closed_by = Some("closer".to_string());
        ticket.rating = rating;
        ticket
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(at(2024, 3, 9)), "2024-03");
        assert_eq!(month_key(at(2024, 12, 31)), "2024-12");
    }

    #[test]
    fn test_on_ticket_created_counts_categories() {
        let mut stats = TicketStats::default();
        stats.on_ticket_created(&ticket_model("a", "1", TicketCategory::Bug, at(2024, 1, 5)));
        stats.on_ticket_created(&ticket_model("b", "2", TicketCategory::Bug, at(2024, 1, 6)));
        stats.on_ticket_created(&ticket_model("c", "3", TicketCategory::Question, at(2024, 2, 1)));

        assert_eq!(stats.total_tickets, 3);
        assert_eq!(stats.category_stats.len(), 2);
        assert_eq!(stats.category_stats["bug"], 2);
        assert_eq!(stats.category_stats["question"], 1);
        assert_eq!(stats.monthly_stats["2024-01"].created, 2);
        assert_eq!(stats.monthly_stats["2024-02"].created, 1);
    }

    #[test]
    fn test_on_ticket_closed_staff_and_ratings() {
        let mut stats = TicketStats::default();
        let a = ticket_model("a", "1", TicketCategory::Bug, at(2024, 1, 5));
        let b = ticket_model("b", "2", TicketCategory::Bug, at(2024, 1, 6));
        stats.on_ticket_created(&a);
        stats.on_ticket_created(&b);

        stats.on_ticket_closed(&closed(a, at(2024, 1, 7), Some(5), Some(("X", "Xavier"))));
        stats.on_ticket_closed(&closed(b, at(2024, 2, 2), Some(3), Some(("X", "Xavier"))));

        assert_eq!(stats.closed_tickets, 2);
        assert_eq!(stats.total_ratings, 2);
        assert_eq!(stats.rating_sum, 8);
        assert_eq!(stats.average_rating, 4.0);

        let staff = &stats.staff_stats["X"];
        assert_eq!(staff.name, "Xavier");
        assert_eq!(staff.tickets_closed, 2);
        assert_eq!(staff.rating_count, 2);
        assert_eq!(staff.total_rating, 8);
        assert_eq!(staff.average_rating, 4.0);

        // Closures are bucketed by the close timestamp
        assert_eq!(stats.monthly_stats["2024-01"].closed, 1);
        assert_eq!(stats.monthly_stats["2024-01"].ratings, vec![5]);
        assert_eq!(stats.monthly_stats["2024-02"].closed, 1);
        assert_eq!(stats.monthly_stats["2024-02"].created, 0);
        assert_eq!(stats.monthly_stats["2024-02"].ratings, vec![3]);
    }

    #[test]
    fn test_on_ticket_closed_without_claim_or_rating() {
        let mut stats = TicketStats::default();
        let a = ticket_model("a", "1", TicketCategory::Other, at(2024, 1, 5));
        stats.on_ticket_created(&a);
        stats.on_ticket_closed(&closed(a, at(2024, 1, 5), None, None));

        assert_eq!(stats.closed_tickets, 1);
        assert_eq!(stats.total_ratings, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.average_rating(), 0.0);
        assert!(stats.staff_stats.is_empty());
    }

    #[test]
    fn test_staff_without_ratings_keeps_zero_average() {
        let mut stats = TicketStats::default();
        let a = ticket_model("a", "1", TicketCategory::Bug, at(2024, 1, 5));
        stats.on_ticket_closed(&closed(a, at(2024, 1, 5), None, Some(("Y", "Yara"))));

        let staff = &stats.staff_stats["Y"];
        assert_eq!(staff.tickets_closed, 1);
        assert_eq!(staff.rating_count, 0);
        assert_eq!(staff.average_rating, 0.0);
    }

    #[test]
    fn test_rebuild_matches_incremental() {
        let base = at(2024, 1, 30);
        let tickets = vec![
            ticket_model("a", "1", TicketCategory::Bug, base),
            ticket_model("b", "2", TicketCategory::Economy, base + Duration::hours(1)),
            ticket_model("c", "3", TicketCategory::Bug, base + Duration::days(3)),
        ];

        let mut incremental = TicketStats::default();
        for t in &tickets {
            incremental.on_ticket_created(t);
        }

        let closed_b = closed(
            tickets[1].clone(),
            base + Duration::days(1),
            Some(2),
            Some(("S", "Sam")),
        );
        incremental.on_ticket_closed(&closed_b);
        let closed_a = closed(
            tickets[0].clone(),
            base + Duration::days(4),
            Some(5),
            Some(("S", "Sam")),
        );
        incremental.on_ticket_closed(&closed_a);

        let log = vec![closed_a, closed_b, tickets[2].clone()];
        let rebuilt = TicketStats::rebuild(&log);

        assert_eq!(rebuilt, incremental);
        assert_eq!(
            serde_json::to_string(&rebuilt).unwrap(),
            serde_json::to_string(&incremental).unwrap()
        );
    }

    #[test]
    fn test_document_uses_original_field_names() {
        let mut stats = TicketStats::default();
        stats.on_ticket_created(&ticket_model("a", "1", TicketCategory::Bug, at(2024, 1, 5)));
        let json: serde_json::Value = serde_json::to_value(&stats).unwrap();

        for field in [
            "totalTickets",
            "closedTickets",
            "averageRating",
            "totalRatings",
            "ratingSum",
            "staffStats",
            "categoryStats",
            "monthlyStats",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_document_with_legacy_categories_parses() {
        let json = r#"{
            "totalTickets": 2,
            "closedTickets": 0,
            "averageRating": 0,
            "totalRatings": 0,
            "ratingSum": 0,
            "staffStats": {},
            "categoryStats": {"Bug no spawn": 1, "duvida": 1},
            "monthlyStats": {"2024-05": {"created": 2, "closed": 0, "ratings": []}}
        }"#;

        let stats: TicketStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_tickets, 2);
        assert_eq!(stats.category_stats["Bug no spawn"], 1);
        assert_eq!(stats.monthly_stats["2024-05"].created, 2);
    }

    #[tokio::test]
    async fn test_save_and_load_stats() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(load_stats(&db).await?.is_none());

        let mut stats = TicketStats::default();
        stats.on_ticket_created(&ticket_model("a", "1", TicketCategory::Bug, at(2024, 1, 5)));
        save_stats(&db, &stats).await?;
        assert_eq!(load_stats(&db).await?, Some(stats.clone()));

        // Saving again updates the same row
        stats.on_ticket_created(&ticket_model("b", "1", TicketCategory::Bug, at(2024, 1, 6)));
        save_stats(&db, &stats).await?;
        assert_eq!(load_stats(&db).await?.unwrap().total_tickets, 2);
        let rows = SystemState::find()
            .filter(system_state::Column::Key.eq(STATS_KEY))
            .count(&db)
            .await?;
        assert_eq!(rows, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_load_or_rebuild_recovers_corrupt_document() -> Result<()> {
        let db = setup_test_db().await?;
        store::insert_ticket(&db, sample_ticket("1", TicketCategory::Report), Utc::now()).await?;

        system_state::ActiveModel {
            key: Set(STATS_KEY.to_string()),
            value: Set("{ not json".to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert!(matches!(
            load_stats(&db).await,
            Err(Error::StatsDocument { .. })
        ));

        let (stats, rebuilt) = load_or_rebuild(&db).await?;
        assert!(rebuilt);
        assert_eq!(stats.total_tickets, 1);
        assert_eq!(stats.category_stats["report"], 1);
        Ok(())
    }
}
