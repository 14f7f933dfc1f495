//! Swap negotiation aggregate root.

use super::{NegotiationId, SwapDomainError, SwapOutcome};
use crate::slot::domain::{SlotId, SwapLock, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Proposal to exchange ownership of two slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapNegotiation {
    id: NegotiationId,
    proposer_id: UserId,
    offered_slot_id: SlotId,
    requested_slot_id: SlotId,
    outcome: SwapOutcome,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedNegotiationData {
    /// Persisted negotiation identifier.
    pub id: NegotiationId,
    /// Persisted proposer identity.
    pub proposer_id: UserId,
    /// Persisted offered slot.
    pub offered_slot_id: SlotId,
    /// Persisted requested slot.
    pub requested_slot_id: SlotId,
    /// Persisted outcome.
    pub outcome: SwapOutcome,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted resolution timestamp, if resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SwapNegotiation {
    /// Opens a pending negotiation offering `offered` in exchange for
    /// `requested`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapDomainError::SameSlot`] when both slots are the same.
    pub fn propose(
        proposer_id: UserId,
        offered_slot_id: SlotId,
        requested_slot_id: SlotId,
        clock: &impl Clock,
    ) -> Result<Self, SwapDomainError> {
        if offered_slot_id == requested_slot_id {
            return Err(SwapDomainError::SameSlot(offered_slot_id));
        }
        Ok(Self {
            id: NegotiationId::new(),
            proposer_id,
            offered_slot_id,
            requested_slot_id,
            outcome: SwapOutcome::Pending,
            created_at: clock.utc(),
            resolved_at: None,
        })
    }

    /// Reconstructs a negotiation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedNegotiationData) -> Self {
        Self {
            id: data.id,
            proposer_id: data.proposer_id,
            offered_slot_id: data.offered_slot_id,
            requested_slot_id: data.requested_slot_id,
            outcome: data.outcome,
            created_at: data.created_at,
            resolved_at: data.resolved_at,
        }
    }

    /// Returns the negotiation identifier.
    #[must_use]
    pub const fn id(&self) -> NegotiationId {
        self.id
    }

    /// Returns the proposer.
    #[must_use]
    pub const fn proposer_id(&self) -> UserId {
        self.proposer_id
    }

    /// Returns the slot offered by the proposer.
    #[must_use]
    pub const fn offered_slot_id(&self) -> SlotId {
        self.offered_slot_id
    }

    /// Returns the slot the proposer wants in return.
    #[must_use]
    pub const fn requested_slot_id(&self) -> SlotId {
        self.requested_slot_id
    }

    /// Returns the current outcome.
    #[must_use]
    pub const fn outcome(&self) -> SwapOutcome {
        self.outcome
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the negotiation was resolved, if it has been.
    #[must_use]
    pub const fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the lock token both slots carry while this negotiation is
    /// pending.
    #[must_use]
    pub const fn swap_lock(&self) -> SwapLock {
        self.id.swap_lock()
    }

    /// Returns both slot identifiers in ascending order.
    ///
    /// Multi-slot lock operations follow this order so that two negotiations
    /// naming the same pair never acquire them in opposite orders.
    #[must_use]
    pub fn slots_in_lock_order(&self) -> [SlotId; 2] {
        if self.offered_slot_id <= self.requested_slot_id {
            [self.offered_slot_id, self.requested_slot_id]
        } else {
            [self.requested_slot_id, self.offered_slot_id]
        }
    }

    /// Moves a pending negotiation to `Accepted` or `Rejected`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapDomainError::AlreadyResolved`] when the negotiation is
    /// terminal; the negotiation is left unchanged.
    pub fn resolve(&mut self, accept: bool, clock: &impl Clock) -> Result<(), SwapDomainError> {
        self.ensure_pending()?;
        self.outcome = if accept {
            SwapOutcome::Accepted
        } else {
            SwapOutcome::Rejected
        };
        self.resolved_at = Some(clock.utc());
        Ok(())
    }

    /// Checks that the negotiation has not been resolved yet.
    ///
    /// # Errors
    ///
    /// Returns [`SwapDomainError::AlreadyResolved`] for terminal negotiations.
    pub const fn ensure_pending(&self) -> Result<(), SwapDomainError> {
        if self.outcome.is_terminal() {
            return Err(SwapDomainError::AlreadyResolved {
                id: self.id,
                outcome: self.outcome,
            });
        }
        Ok(())
    }
}
