//! Adapter implementations of the negotiation repository port.

pub mod memory;
pub mod postgres;
