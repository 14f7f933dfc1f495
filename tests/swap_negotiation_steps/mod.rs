//! Step definitions for slot swap negotiation scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
