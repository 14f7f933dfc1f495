//! Error types for swap negotiation validation and parsing.

use super::{NegotiationId, SwapOutcome};
use crate::slot::domain::SlotId;
use thiserror::Error;

/// Errors returned while creating or resolving swap negotiations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SwapDomainError {
    /// The offered and requested slots are the same slot.
    #[error("slot {0} cannot be swapped with itself")]
    SameSlot(SlotId),

    /// The negotiation has already reached a terminal outcome.
    #[error("negotiation {id} is already {outcome}")]
    AlreadyResolved {
        /// Negotiation that was resolved earlier.
        id: NegotiationId,
        /// Terminal outcome already recorded.
        outcome: SwapOutcome,
    },
}

/// Error returned while parsing negotiation outcomes from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown swap outcome: {0}")]
pub struct ParseSwapOutcomeError(pub String);
