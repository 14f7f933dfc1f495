//! Service layer orchestrating two-slot swap negotiations.
//!
//! [`SwapNegotiator`] drives both slots of a negotiation through the slot
//! registry. Slots are always locked and released in ascending identifier
//! order, and every partial failure while proposing is rolled back before the
//! error is returned.

use crate::error::ErrorKind;
use crate::slot::{
    domain::{Slot, SlotId, SlotStatus, UserId},
    ports::{SlotRepository, SlotRepositoryError},
    services::{SlotRegistryError, SlotRegistryService},
};
use crate::swap::{
    domain::{NegotiationId, SwapDomainError, SwapNegotiation},
    ports::{NegotiationRepository, NegotiationRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Request payload for proposing a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposeSwapRequest {
    proposer_id: UserId,
    offered_slot_id: SlotId,
    requested_slot_id: SlotId,
}

impl ProposeSwapRequest {
    /// Creates a proposal offering `offered_slot_id` for `requested_slot_id`.
    #[must_use]
    pub const fn new(
        proposer_id: UserId,
        offered_slot_id: SlotId,
        requested_slot_id: SlotId,
    ) -> Self {
        Self {
            proposer_id,
            offered_slot_id,
            requested_slot_id,
        }
    }
}

/// Request payload for accepting or rejecting a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSwapRequest {
    resolver_id: UserId,
    negotiation_id: NegotiationId,
    accept: bool,
}

impl ResolveSwapRequest {
    /// Creates a resolution request.
    #[must_use]
    pub const fn new(resolver_id: UserId, negotiation_id: NegotiationId, accept: bool) -> Self {
        Self {
            resolver_id,
            negotiation_id,
            accept,
        }
    }

    /// Creates a request accepting the negotiation.
    #[must_use]
    pub const fn accept(resolver_id: UserId, negotiation_id: NegotiationId) -> Self {
        Self::new(resolver_id, negotiation_id, true)
    }

    /// Creates a request rejecting the negotiation.
    #[must_use]
    pub const fn reject(resolver_id: UserId, negotiation_id: NegotiationId) -> Self {
        Self::new(resolver_id, negotiation_id, false)
    }
}

/// Service-level errors for swap negotiation operations.
#[derive(Debug, Error)]
pub enum SwapNegotiationError {
    /// Negotiation validation or transition failed.
    #[error(transparent)]
    Domain(#[from] SwapDomainError),

    /// A slot registry operation failed.
    #[error(transparent)]
    Registry(#[from] SlotRegistryError),

    /// Negotiation persistence failed.
    #[error(transparent)]
    Repository(#[from] NegotiationRepositoryError),

    /// A named slot does not exist.
    #[error("slot {0} not found")]
    SlotNotFound(SlotId),

    /// No negotiation exists with the given identifier.
    #[error("negotiation {0} not found")]
    NegotiationNotFound(NegotiationId),

    /// The proposer does not own the offered slot.
    #[error("user {proposer_id} does not own offered slot {slot_id}")]
    NotOfferedSlotOwner {
        /// Offered slot.
        slot_id: SlotId,
        /// Caller who attempted the proposal.
        proposer_id: UserId,
    },

    /// The resolver does not own the requested slot.
    #[error("user {resolver_id} does not own the slot requested by negotiation {negotiation_id}")]
    NotRequestedSlotOwner {
        /// Negotiation being resolved.
        negotiation_id: NegotiationId,
        /// Caller who attempted the resolution.
        resolver_id: UserId,
    },

    /// The proposer already owns the requested slot.
    #[error("user already owns requested slot {0}")]
    AlreadyOwned(SlotId),

    /// A slot is not open for trading.
    #[error("slot {slot_id} is {status}, not tradable")]
    NotTradable {
        /// Slot that failed the check.
        slot_id: SlotId,
        /// Status observed at check time.
        status: SlotStatus,
    },

    /// A pending negotiation no longer holds its slots because a concurrent
    /// resolution got there first.
    #[error("negotiation {0} no longer holds its slots")]
    NoLongerHeld(NegotiationId),

    /// A compensating lock release failed, leaving slots pending under the
    /// negotiation's lock.
    #[error("failed to release swap locks of negotiation {negotiation_id} during rollback")]
    RollbackFailed {
        /// Negotiation whose locks could not be released.
        negotiation_id: NegotiationId,
        /// Registry failure raised by the release.
        #[source]
        source: SlotRegistryError,
    },
}

impl SwapNegotiationError {
    /// Returns the stable error category for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(SwapDomainError::SameSlot(_)) | Self::AlreadyOwned(_) => {
                ErrorKind::InvalidRequest
            }
            Self::Domain(SwapDomainError::AlreadyResolved { .. })
            | Self::NotTradable { .. }
            | Self::NoLongerHeld(_)
            | Self::Repository(
                NegotiationRepositoryError::AlreadyResolved(_)
                | NegotiationRepositoryError::Slot(SlotRepositoryError::RevisionConflict { .. }),
            ) => ErrorKind::InvalidTransition,
            Self::Registry(err) => err.kind(),
            Self::SlotNotFound(_)
            | Self::NegotiationNotFound(_)
            | Self::Repository(
                NegotiationRepositoryError::NotFound(_)
                | NegotiationRepositoryError::Slot(SlotRepositoryError::NotFound(_)),
            ) => ErrorKind::NotFound,
            Self::NotOfferedSlotOwner { .. } | Self::NotRequestedSlotOwner { .. } => {
                ErrorKind::Forbidden
            }
            Self::Repository(_) | Self::RollbackFailed { .. } => ErrorKind::Persistence,
        }
    }
}

/// Result type for swap negotiation service operations.
pub type SwapNegotiationResult<T> = Result<T, SwapNegotiationError>;

/// Swap negotiation orchestration service.
pub struct SwapNegotiator<S, N, C>
where
    S: SlotRepository,
    N: NegotiationRepository,
    C: Clock + Send + Sync,
{
    registry: SlotRegistryService<S, C>,
    negotiations: Arc<N>,
    clock: Arc<C>,
}

impl<S, N, C> Clone for SwapNegotiator<S, N, C>
where
    S: SlotRepository,
    N: NegotiationRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            negotiations: Arc::clone(&self.negotiations),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, N, C> SwapNegotiator<S, N, C>
where
    S: SlotRepository,
    N: NegotiationRepository,
    C: Clock + Send + Sync,
{
    /// Creates a negotiator over an existing slot registry.
    #[must_use]
    pub const fn new(
        registry: SlotRegistryService<S, C>,
        negotiations: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            registry,
            negotiations,
            clock,
        }
    }

    /// Returns the slot registry this negotiator drives.
    #[must_use]
    pub const fn registry(&self) -> &SlotRegistryService<S, C> {
        &self.registry
    }

    /// Opens a negotiation offering one of the proposer's slots for another
    /// user's slot.
    ///
    /// On success both slots are `PendingSwap` under the negotiation's lock.
    /// On failure neither slot is left locked unless a compensating release
    /// itself failed, which is reported as
    /// [`SwapNegotiationError::RollbackFailed`].
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidRequest`] error when both slots are the
    /// same or the proposer already owns the requested slot,
    /// [`SwapNegotiationError::SlotNotFound`] for unknown slots,
    /// [`SwapNegotiationError::NotOfferedSlotOwner`] when the proposer does not
    /// own the offered slot, and an [`ErrorKind::InvalidTransition`] error
    /// when either slot is not tradable or is locked concurrently.
    #[instrument(
        skip(self, request),
        fields(
            proposer_id = %request.proposer_id,
            offered_slot_id = %request.offered_slot_id,
            requested_slot_id = %request.requested_slot_id,
        )
    )]
    pub async fn propose(
        &self,
        request: ProposeSwapRequest,
    ) -> SwapNegotiationResult<SwapNegotiation> {
        let ProposeSwapRequest {
            proposer_id,
            offered_slot_id,
            requested_slot_id,
        } = request;

        let negotiation =
            SwapNegotiation::propose(proposer_id, offered_slot_id, requested_slot_id, &*self.clock)?;
        let offered = self.slot_or_error(offered_slot_id).await?;
        let requested = self.slot_or_error(requested_slot_id).await?;

        if !offered.is_owned_by(proposer_id) {
            return Err(SwapNegotiationError::NotOfferedSlotOwner {
                slot_id: offered_slot_id,
                proposer_id,
            });
        }
        if requested.is_owned_by(proposer_id) {
            return Err(SwapNegotiationError::AlreadyOwned(requested_slot_id));
        }
        for slot in [&offered, &requested] {
            ensure_tradable(slot)?;
        }

        self.lock_pair(&negotiation).await?;

        if let Err(err) = self.negotiations.store(&negotiation).await {
            warn!(error = %err, "storing negotiation failed, releasing slot locks");
            let [first, second] = negotiation.slots_in_lock_order();
            if let Err(source) = self
                .registry
                .release_pair(first, second, negotiation.swap_lock())
                .await
            {
                return Err(rollback_failed(negotiation.id(), source));
            }
            return Err(err.into());
        }

        info!(negotiation_id = %negotiation.id(), "swap proposed");
        Ok(negotiation)
    }

    /// Accepts or rejects a pending negotiation on behalf of the owner of the
    /// requested slot.
    ///
    /// Accepting exchanges the owners of both slots and marks them `Busy`;
    /// rejecting returns both slots to `Tradable`. Both slot writes and the
    /// outcome are stored in one repository operation, so a failure leaves
    /// the negotiation pending with both slots still locked. Of two
    /// concurrent resolutions at most one succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SwapNegotiationError::NegotiationNotFound`] for unknown
    /// negotiations, an [`ErrorKind::InvalidTransition`] error when the
    /// negotiation is already resolved or is being resolved concurrently, and
    /// [`SwapNegotiationError::NotRequestedSlotOwner`] when the resolver does
    /// not own the requested slot.
    #[instrument(
        skip(self, request),
        fields(
            negotiation_id = %request.negotiation_id,
            resolver_id = %request.resolver_id,
            accept = request.accept,
        )
    )]
    pub async fn resolve(
        &self,
        request: ResolveSwapRequest,
    ) -> SwapNegotiationResult<SwapNegotiation> {
        let ResolveSwapRequest {
            resolver_id,
            negotiation_id,
            accept,
        } = request;

        let mut negotiation = self
            .negotiations
            .find_by_id(negotiation_id)
            .await?
            .ok_or(SwapNegotiationError::NegotiationNotFound(negotiation_id))?;
        negotiation.ensure_pending()?;

        let lock = negotiation.swap_lock();
        let requested = self.slot_or_error(negotiation.requested_slot_id()).await?;
        if requested.swap_lock() != Some(lock) {
            return Err(SwapNegotiationError::NoLongerHeld(negotiation_id));
        }
        if !requested.is_owned_by(resolver_id) {
            return Err(SwapNegotiationError::NotRequestedSlotOwner {
                negotiation_id,
                resolver_id,
            });
        }

        let [first, second] = negotiation.slots_in_lock_order();
        let slots = if accept {
            self.registry.plan_exchange(first, second, lock).await?
        } else {
            self.registry.plan_release_pair(first, second, lock).await?
        };

        negotiation.resolve(accept, &*self.clock)?;
        self.negotiations
            .record_resolution(&negotiation, &slots)
            .await?;
        info!(outcome = %negotiation.outcome(), "negotiation resolved");
        Ok(negotiation)
    }

    /// Returns every `Tradable` slot not owned by `excluding_owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SwapNegotiationError::Registry`] when slot lookup fails.
    pub async fn list_tradable(&self, excluding_owner: UserId) -> SwapNegotiationResult<Vec<Slot>> {
        Ok(self.registry.list_tradable(excluding_owner).await?)
    }

    /// Returns pending negotiations requesting a slot `user_id` currently
    /// owns, newest first.
    ///
    /// # Errors
    ///
    /// Returns registry or repository errors when lookup fails.
    pub async fn list_incoming(&self, user_id: UserId) -> SwapNegotiationResult<Vec<SwapNegotiation>> {
        let owned: Vec<SlotId> = self
            .registry
            .list_owned(user_id)
            .await?
            .iter()
            .map(Slot::id)
            .collect();
        if owned.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .negotiations
            .list_pending_for_requested_slots(&owned)
            .await?)
    }

    /// Returns every negotiation `user_id` proposed, in any outcome, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`SwapNegotiationError::Repository`] when lookup fails.
    pub async fn list_outgoing(&self, user_id: UserId) -> SwapNegotiationResult<Vec<SwapNegotiation>> {
        Ok(self.negotiations.list_by_proposer(user_id).await?)
    }

    /// Finds a negotiation by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SwapNegotiationError::Repository`] when lookup fails.
    pub async fn find_negotiation(
        &self,
        negotiation_id: NegotiationId,
    ) -> SwapNegotiationResult<Option<SwapNegotiation>> {
        Ok(self.negotiations.find_by_id(negotiation_id).await?)
    }

    async fn slot_or_error(&self, slot_id: SlotId) -> SwapNegotiationResult<Slot> {
        self.registry
            .find_slot(slot_id)
            .await?
            .ok_or(SwapNegotiationError::SlotNotFound(slot_id))
    }

    /// Locks both slots in ascending order, releasing the first if the second
    /// cannot be taken.
    async fn lock_pair(&self, negotiation: &SwapNegotiation) -> SwapNegotiationResult<()> {
        let lock = negotiation.swap_lock();
        let [first, second] = negotiation.slots_in_lock_order();

        self.registry.lock_for_swap(first, lock).await?;
        if let Err(err) = self.registry.lock_for_swap(second, lock).await {
            warn!(slot_id = %second, error = %err, "second slot lock failed, releasing first");
            if let Err(source) = self.registry.release_lock(first, lock).await {
                return Err(rollback_failed(negotiation.id(), source));
            }
            return Err(err.into());
        }
        debug!("both slots locked");
        Ok(())
    }
}

fn rollback_failed(negotiation_id: NegotiationId, source: SlotRegistryError) -> SwapNegotiationError {
    error!(%negotiation_id, error = %source, "rollback could not release swap locks");
    SwapNegotiationError::RollbackFailed {
        negotiation_id,
        source,
    }
}

fn ensure_tradable(slot: &Slot) -> SwapNegotiationResult<()> {
    if slot.status() != SlotStatus::Tradable {
        return Err(SwapNegotiationError::NotTradable {
            slot_id: slot.id(),
            status: slot.status(),
        });
    }
    Ok(())
}
