//! Ticket store - the durable log of ticket records.
//!
//! Functions are generic over [`ConnectionTrait`] so the desk can run them
//! inside a database transaction together with the statistics update. The
//! store does not serialize writers itself; see [`crate::core::desk`].

use crate::{
    entities::{Ticket, TicketCategory, TicketStatus, ticket},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::{fmt, str::FromStr};

/// Input for opening a new ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    /// Caller-supplied id; a time-based id is allocated when `None`
    pub id: Option<String>,
    /// Discord user ID of the requester
    pub requester_id: String,
    /// Discord username of the requester
    pub requester_name: String,
    /// In-game nickname, when the ticket form asked for one
    pub game_nick: Option<String>,
    /// Ticket category
    pub category: TicketCategory,
    /// Problem description
    pub description: String,
    /// Discord channel backing the ticket
    pub channel_id: Option<String>,
}

impl NewTicket {
    /// Minimal ticket input with no id, nickname or channel.
    #[must_use]
    pub fn new(
        requester_id: impl Into<String>,
        requester_name: impl Into<String>,
        category: TicketCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            requester_id: requester_id.into(),
            requester_name: requester_name.into(),
            game_nick: None,
            category,
            description: description.into(),
            channel_id: None,
        }
    }

    /// Sets the Discord channel backing the ticket.
    #[must_use]
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Sets the in-game nickname.
    #[must_use]
    pub fn with_game_nick(mut self, game_nick: impl Into<String>) -> Self {
        self.game_nick = Some(game_nick.into());
        self
    }
}

impl TicketCategory {
    /// Every category, in menu order.
    pub const ALL: [Self; 6] = [
        Self::Bug,
        Self::Question,
        Self::Economy,
        Self::Report,
        Self::Suggestion,
        Self::Other,
    ];

    /// Stored form of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Question => "question",
            Self::Economy => "economy",
            Self::Report => "report",
            Self::Suggestion => "suggestion",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bug => "Bug/Problem",
            Self::Question => "Question",
            Self::Economy => "Economy/Shop",
            Self::Report => "Player Report",
            Self::Suggestion => "Suggestion",
            Self::Other => "Other",
        }
    }

    /// Emoji shown next to the category.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Bug => "🐛",
            Self::Question => "❓",
            Self::Economy => "💰",
            Self::Report => "👤",
            Self::Suggestion => "🎮",
            Self::Other => "📋",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketCategory {
    type Err = Error;

    /// Parses free text from the ticket form. English and Portuguese names are
    /// accepted, ignoring case and accents.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                other => other,
            })
            .collect();

        match normalized.as_str() {
            "bug" | "bugs" | "problem" | "problema" => Ok(Self::Bug),
            "question" | "duvida" | "pergunta" => Ok(Self::Question),
            "economy" | "economia" | "shop" | "loja" => Ok(Self::Economy),
            "report" | "denuncia" => Ok(Self::Report),
            "suggestion" | "sugestao" => Ok(Self::Suggestion),
            "other" | "outro" | "outros" => Ok(Self::Other),
            _ => Err(Error::InvalidCategory {
                category: s.to_string(),
            }),
        }
    }
}

/// Checks that a rating is within 1-5.
pub const fn validate_rating(rating: i32) -> Result<i32> {
    if rating >= 1 && rating <= 5 {
        Ok(rating)
    } else {
        Err(Error::InvalidRating { rating })
    }
}

/// Allocates a time-based id, `ticket-<millis>`, adding a zero-padded `-NNNN`
/// suffix when another ticket was opened in the same millisecond. The padding
/// keeps ids of one millisecond sorting in allocation order.
async fn allocate_ticket_id<C>(conn: &C, now: DateTime<Utc>) -> Result<String>
where
    C: ConnectionTrait,
{
    let base = format!("ticket-{}", now.timestamp_millis());
    let mut candidate = base.clone();
    let mut suffix = 1u32;

    while Ticket::find_by_id(candidate.clone()).one(conn).await?.is_some() {
        candidate = format!("{base}-{suffix:04}");
        suffix += 1;
    }

    Ok(candidate)
}

/// Appends a new open ticket to the log.
///
/// # Errors
/// Returns [`Error::DuplicateTicket`] when a caller-supplied id is taken, or a
/// database error if the insert fails.
pub async fn insert_ticket<C>(conn: &C, new: NewTicket, now: DateTime<Utc>) -> Result<ticket::Model>
where
    C: ConnectionTrait,
{
    let id = match new.id {
        Some(id) => {
            if Ticket::find_by_id(id.clone()).one(conn).await?.is_some() {
                return Err(Error::DuplicateTicket { id });
            }
            id
        }
        None => allocate_ticket_id(conn, now).await?,
    };

    let ticket = ticket::ActiveModel {
        id: Set(id),
        requester_id: Set(new.requester_id),
        requester_name: Set(new.requester_name),
        game_nick: Set(new.game_nick),
        category: Set(new.category),
        description: Set(new.description),
        channel_id: Set(new.channel_id),
        status: Set(TicketStatus::Open),
        created_at: Set(now),
        claimed_by_id: Set(None),
        claimed_by_name: Set(None),
        claimed_at: Set(None),
        closed_at: Set(None),
        closed_by: Set(None),
        rating: Set(None),
        feedback: Set(None),
    };

    ticket.insert(conn).await.map_err(Into::into)
}

/// Marks a ticket as claimed by a staff member. A repeated claim replaces the
/// previous claimer.
///
/// # Errors
/// Returns [`Error::TicketClosed`] if the ticket is already closed.
pub async fn set_claimed<C>(
    conn: &C,
    ticket: ticket::Model,
    staff_id: &str,
    staff_name: &str,
    now: DateTime<Utc>,
) -> Result<ticket::Model>
where
    C: ConnectionTrait,
{
    if ticket.is_closed() {
        return Err(Error::TicketClosed { id: ticket.id });
    }

    let mut active_model: ticket::ActiveModel = ticket.into();
    active_model.status = Set(TicketStatus::Claimed);
    active_model.claimed_by_id = Set(Some(staff_id.to_string()));
    active_model.claimed_by_name = Set(Some(staff_name.to_string()));
    active_model.claimed_at = Set(Some(now));

    active_model.update(conn).await.map_err(Into::into)
}

/// Closes a ticket, recording who closed it and the optional rating.
///
/// Feedback is only kept when a rating is given. The rating must already be
/// validated with [`validate_rating`].
pub async fn set_closed<C>(
    conn: &C,
    ticket: ticket::Model,
    closed_by: &str,
    rating: Option<i32>,
    feedback: Option<String>,
    now: DateTime<Utc>,
) -> Result<ticket::Model>
where
    C: ConnectionTrait,
{
    let feedback = rating
        .and(feedback)
        .filter(|text| !text.trim().is_empty());

    let mut active_model: ticket::ActiveModel = ticket.into();
    active_model.status = Set(TicketStatus::Closed);
    active_model.closed_at = Set(Some(now));
    active_model.closed_by = Set(Some(closed_by.to_string()));
    active_model.rating = Set(rating);
    active_model.feedback = Set(feedback);

    active_model.update(conn).await.map_err(Into::into)
}

/// Returns every ticket in insertion order.
pub async fn get_all<C>(conn: &C) -> Result<Vec<ticket::Model>>
where
    C: ConnectionTrait,
{
    Ticket::find()
        .order_by_asc(ticket::Column::CreatedAt)
        .order_by_asc(ticket::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Finds a ticket by its id.
pub async fn get_by_id<C>(conn: &C, ticket_id: &str) -> Result<Option<ticket::Model>>
where
    C: ConnectionTrait,
{
    Ticket::find_by_id(ticket_id.to_string())
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Returns all tickets opened by a requester, oldest first.
pub async fn get_by_requester<C>(conn: &C, requester_id: &str) -> Result<Vec<ticket::Model>>
where
    C: ConnectionTrait,
{
    Ticket::find()
        .filter(ticket::Column::RequesterId.eq(requester_id))
        .order_by_asc(ticket::Column::CreatedAt)
        .order_by_asc(ticket::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Finds the ticket backed by a Discord channel.
pub async fn get_by_channel<C>(conn: &C, channel_id: &str) -> Result<Option<ticket::Model>>
where
    C: ConnectionTrait,
{
    Ticket::find()
        .filter(ticket::Column::ChannelId.eq(channel_id))
        .order_by_desc(ticket::Column::CreatedAt)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Finds the requester's ticket that is not closed yet, if any.
pub async fn open_ticket_for<C>(conn: &C, requester_id: &str) -> Result<Option<ticket::Model>>
where
    C: ConnectionTrait,
{
    Ticket::find()
        .filter(ticket::Column::RequesterId.eq(requester_id))
        .filter(ticket::Column::Status.ne(TicketStatus::Closed))
        .order_by_desc(ticket::Column::CreatedAt)
        .one(conn)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[test]
    fn test_category_from_str_aliases() {
        assert_eq!("bug".parse::<TicketCategory>().unwrap(), TicketCategory::Bug);
        assert_eq!(
            "Dúvida".parse::<TicketCategory>().unwrap(),
            TicketCategory::Question
        );
        assert_eq!(
            " LOJA ".parse::<TicketCategory>().unwrap(),
            TicketCategory::Economy
        );
        assert_eq!(
            "denúncia".parse::<TicketCategory>().unwrap(),
            TicketCategory::Report
        );
        assert_eq!(
            "Sugestão".parse::<TicketCategory>().unwrap(),
            TicketCategory::Suggestion
        );
        assert_eq!(
            "outros".parse::<TicketCategory>().unwrap(),
            TicketCategory::Other
        );
    }

    #[test]
    fn test_category_from_str_rejects_unknown() {
        let result = "crash".parse::<TicketCategory>();
        assert!(matches!(result, Err(Error::InvalidCategory { category }) if category == "crash"));
    }

    #[test]
    fn test_category_round_trips_through_as_str() {
        for category in TicketCategory::ALL {
            assert_eq!(category.as_str().parse::<TicketCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_validate_rating() {
        assert_eq!(validate_rating(1).unwrap(), 1);
        assert_eq!(validate_rating(5).unwrap(), 5);
        assert!(matches!(
            validate_rating(0),
            Err(Error::InvalidRating { rating: 0 })
        ));
        assert!(matches!(
            validate_rating(6),
            Err(Error::InvalidRating { rating: 6 })
        ));
    }

    #[tokio::test]
    async fn test_insert_ticket_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let ticket = insert_ticket(
            &db,
            NewTicket::new("42", "steve", TicketCategory::Bug, "Chest vanished")
                .with_channel("900")
                .with_game_nick("Steve_MC"),
            now,
        )
        .await?;

        assert_eq!(ticket.id, format!("ticket-{}", now.timestamp_millis()));
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.channel_id.as_deref(), Some("900"));
        assert_eq!(ticket.game_nick.as_deref(), Some("Steve_MC"));
        assert!(ticket.claimed_by().is_none());
        assert!(ticket.closed_at.is_none());
        assert!(ticket.closed_by.is_none());
        assert!(ticket.rating.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_ticket_same_millisecond_gets_unique_ids() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = insert_ticket(&db, sample_ticket("1", TicketCategory::Bug), now).await?;
        let second = insert_ticket(&db, sample_ticket("2", TicketCategory::Bug), now).await?;
        let third = insert_ticket(&db, sample_ticket("3", TicketCategory::Bug), now).await?;

        assert_ne!(first.id, second.id);
        assert_ne!(second.id, third.id);
        assert_eq!(second.id, format!("{}-0001", first.id));
        assert_eq!(third.id, format!("{}-0002", first.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_ticket_rejects_duplicate_supplied_id() -> Result<()> {
        let db = setup_test_db().await?;
        let mut new = sample_ticket("1", TicketCategory::Other);
        new.id = Some("ticket-fixed".to_string());

        insert_ticket(&db, new.clone(), Utc::now()).await?;
        let result = insert_ticket(&db, new, Utc::now()).await;

        assert!(matches!(result, Err(Error::DuplicateTicket { id }) if id == "ticket-fixed"));
        assert_eq!(get_all(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_claimed_last_write_wins() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let ticket = insert_ticket(&db, sample_ticket("1", TicketCategory::Bug), now).await?;

        let ticket = set_claimed(&db, ticket, "staff-a", "Alice", now).await?;
        let later = now + Duration::minutes(5);
        let ticket = set_claimed(&db, ticket, "staff-b", "Bob", later).await?;

        let claimed = ticket.claimed_by().unwrap();
        assert_eq!(ticket.status, TicketStatus::Claimed);
        assert_eq!(claimed.staff_id, "staff-b");
        assert_eq!(claimed.staff_name, "Bob");
        assert_eq!(claimed.claimed_at, later);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_claimed_rejects_closed_ticket() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let ticket = insert_ticket(&db, sample_ticket("1", TicketCategory::Bug), now).await?;
        let ticket = set_closed(&db, ticket, "1", None, None, now).await?;

        let result = set_claimed(&db, ticket.clone(), "staff-a", "Alice", now).await;
        assert!(matches!(result, Err(Error::TicketClosed { .. })));

        let stored = get_by_id(&db, &ticket.id).await?.unwrap();
        assert_eq!(stored.status, TicketStatus::Closed);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_closed_drops_feedback_without_rating() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let ticket = insert_ticket(&db, sample_ticket("1", TicketCategory::Bug), now).await?;

        let closed = set_closed(&db, ticket, "1", None, Some("thanks".to_string()), now).await?;

        assert_eq!(closed.status, TicketStatus::Closed);
        assert_eq!(closed.closed_at, Some(now));
        assert_eq!(closed.closed_by.as_deref(), Some("1"));
        assert!(closed.rating.is_none());
        assert!(closed.feedback.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_queries_by_requester_and_channel() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = insert_ticket(&db, sample_ticket("7", TicketCategory::Bug), now).await?;
        let first = set_closed(&db, first, "7", None, None, now).await?;
        let second = insert_ticket(
            &db,
            sample_ticket("7", TicketCategory::Question).with_channel("555"),
            now + Duration::seconds(1),
        )
        .await?;
        insert_ticket(&db, sample_ticket("8", TicketCategory::Other), now).await?;

        let by_requester = get_by_requester(&db, "7").await?;
        assert_eq!(by_requester.len(), 2);
        assert_eq!(by_requester[0].id, first.id);
        assert_eq!(by_requester[1].id, second.id);

        let by_channel = get_by_channel(&db, "555").await?.unwrap();
        assert_eq!(by_channel.id, second.id);
        assert!(get_by_channel(&db, "556").await?.is_none());

        let open = open_ticket_for(&db, "7").await?.unwrap();
        assert_eq!(open.id, second.id);
        assert!(open_ticket_for(&db, "9").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_is_in_insertion_order() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        for (offset, requester) in ["a", "b", "c"].iter().enumerate() {
            let at = now + Duration::seconds(i64::try_from(offset).unwrap());
            insert_ticket(&db, sample_ticket(requester, TicketCategory::Bug), at).await?;
        }

        let requesters: Vec<String> = get_all(&db)
            .await?
            .into_iter()
            .map(|t| t.requester_id)
            .collect();
        assert_eq!(requesters, vec!["a", "b", "c"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_same_millisecond_keeps_insertion_order() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let mut inserted = Vec::new();
        for n in 0..12 {
            let ticket =
                insert_ticket(&db, sample_ticket(&n.to_string(), TicketCategory::Bug), now).await?;
            inserted.push(ticket.id);
        }

        let listed: Vec<String> = get_all(&db).await?.into_iter().map(|t| t.id).collect();
        assert_eq!(listed, inserted);
        Ok(())
    }
}
