//! `PostgreSQL` adapters for negotiation persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::{NegotiationPgPool, PostgresNegotiationRepository};
