//! Diesel row models for slot persistence.

use super::schema::slots;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for slot records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SlotRow {
    /// Slot identifier.
    pub id: uuid::Uuid,
    /// Current owner identity.
    pub owner_id: uuid::Uuid,
    /// Human-readable title.
    pub title: String,
    /// Inclusive window start.
    pub starts_at: DateTime<Utc>,
    /// Exclusive window end.
    pub ends_at: DateTime<Utc>,
    /// Tradability status.
    pub status: String,
    /// Negotiation lock token.
    pub swap_lock: Option<uuid::Uuid>,
    /// Optimistic concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for slot records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slots)]
pub struct NewSlotRow {
    /// Slot identifier.
    pub id: uuid::Uuid,
    /// Current owner identity.
    pub owner_id: uuid::Uuid,
    /// Human-readable title.
    pub title: String,
    /// Inclusive window start.
    pub starts_at: DateTime<Utc>,
    /// Exclusive window end.
    pub ends_at: DateTime<Utc>,
    /// Tradability status.
    pub status: String,
    /// Negotiation lock token.
    pub swap_lock: Option<uuid::Uuid>,
    /// Optimistic concurrency revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset applied when replacing a slot.
///
/// `swap_lock` must be written as `NULL` when a lock is released.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = slots)]
#[diesel(treat_none_as_null = true)]
pub struct SlotChangeset {
    /// Current owner identity.
    pub owner_id: uuid::Uuid,
    /// Human-readable title.
    pub title: String,
    /// Inclusive window start.
    pub starts_at: DateTime<Utc>,
    /// Exclusive window end.
    pub ends_at: DateTime<Utc>,
    /// Tradability status.
    pub status: String,
    /// Negotiation lock token.
    pub swap_lock: Option<uuid::Uuid>,
    /// Optimistic concurrency revision.
    pub revision: i64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
