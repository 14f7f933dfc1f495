//! Adapter implementations for the slot repository port.

pub mod memory;
pub mod postgres;
