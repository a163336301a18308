//! System state entity - key/value documents owned by the bot.
//!
//! The ticket statistics document lives here as a single JSON value under the
//! `ticket_stats` key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model - one stored document per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Document key (e.g. `"ticket_stats"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Serialized document
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this document was last written
    pub updated_at: DateTimeUtc,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
