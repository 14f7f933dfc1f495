//! Diesel row models for negotiation persistence.

use super::schema::swap_negotiations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for negotiation records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = swap_negotiations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NegotiationRow {
    pub id: uuid::Uuid,
    pub proposer_id: uuid::Uuid,
    pub offered_slot_id: uuid::Uuid,
    pub requested_slot_id: uuid::Uuid,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Insert model for negotiation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = swap_negotiations)]
pub struct NewNegotiationRow {
    pub id: uuid::Uuid,
    pub proposer_id: uuid::Uuid,
    pub offered_slot_id: uuid::Uuid,
    pub requested_slot_id: uuid::Uuid,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
