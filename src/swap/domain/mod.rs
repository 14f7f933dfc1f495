//! Domain model for two-slot swap negotiations.
//!
//! A negotiation pairs an offered slot with a requested slot and moves from
//! `Pending` to exactly one terminal outcome. The negotiation identifier
//! doubles as the lock token both slots carry while it is pending.

mod error;
mod ids;
mod negotiation;
mod outcome;

pub use error::{ParseSwapOutcomeError, SwapDomainError};
pub use ids::NegotiationId;
pub use negotiation::{PersistedNegotiationData, SwapNegotiation};
pub use outcome::SwapOutcome;
