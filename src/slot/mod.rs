//! Slot registry: ownership and tradability of calendar slots.
//!
//! The registry is the single source of truth for slot status and ownership.
//! Every mutation is a typed transition written back with a revision check,
//! which linearizes concurrent writers per slot. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
