//! Swap negotiation between two slot owners.
//!
//! A proposer offers one of their `Tradable` slots in exchange for another
//! user's `Tradable` slot. Both slots are locked while the negotiation is
//! pending; the owner of the requested slot then accepts, exchanging owners,
//! or rejects, returning both slots to `Tradable`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
