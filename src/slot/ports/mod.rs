//! Port contracts for slot persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by the slot registry.

pub mod repository;

pub use repository::{SlotPairUpdate, SlotRepository, SlotRepositoryError, SlotRepositoryResult};
