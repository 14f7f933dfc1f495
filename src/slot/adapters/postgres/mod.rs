//! `PostgreSQL` adapters for slot persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub(crate) use repository::apply_pair_update;
pub use repository::{PostgresSlotRepository, SlotPgPool};
