//! Error types for slot domain validation and parsing.

use super::{SlotId, SlotStatus, UserId};
use thiserror::Error;

/// Errors returned while constructing or transitioning slot values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlotDomainError {
    /// The slot title is empty after trimming.
    #[error("slot title must not be empty")]
    EmptyTitle,

    /// The slot window does not end after it starts.
    #[error("slot window must end after it starts")]
    InvalidWindow,

    /// The caller does not own the slot.
    #[error("user {caller} does not own slot {slot_id}")]
    NotOwner {
        /// Slot the caller attempted to modify.
        slot_id: SlotId,
        /// Identity of the caller.
        caller: UserId,
    },

    /// The slot status does not permit the requested transition.
    #[error("slot {slot_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Slot the transition was attempted on.
        slot_id: SlotId,
        /// Current slot status.
        from: SlotStatus,
        /// Requested slot status.
        to: SlotStatus,
    },

    /// The slot is locked by a different negotiation.
    #[error("slot {0} is not held by the presented swap lock")]
    LockMismatch(SlotId),

    /// The slot is locked inside a negotiation and cannot be edited.
    #[error("slot {0} is pending a swap and cannot be modified")]
    PendingSwap(SlotId),
}

/// Error returned while parsing slot statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown slot status: {0}")]
pub struct ParseSlotStatusError(pub String);
