//! Slotswap: two-party calendar slot swap negotiation.
//!
//! Users publish calendar slots as tradable and negotiate one-to-one
//! exchanges of ownership with other users. The crate guarantees that a slot
//! is party to at most one pending negotiation, that an accepted swap moves
//! both owners or neither, and that a negotiation is resolved at most once.
//!
//! # Architecture
//!
//! Slotswap follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of ports
//! - **Services**: Orchestration over ports, generic over a clock
//!
//! # Modules
//!
//! - [`slot`]: Slot ownership, tradability and swap locks
//! - [`swap`]: Proposal and resolution of two-slot swaps
//! - [`config`]: `PostgreSQL` store configuration
//! - [`error`]: Stable error categories shared by the services

pub mod config;
pub mod error;
pub mod slot;
pub mod swap;
