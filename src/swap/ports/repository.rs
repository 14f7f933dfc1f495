//! Repository port for swap negotiation persistence.

use crate::slot::{
    domain::{SlotId, UserId},
    ports::{SlotPairUpdate, SlotRepositoryError},
};
use crate::swap::domain::{NegotiationId, SwapNegotiation};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for negotiation repository operations.
pub type NegotiationRepositoryResult<T> = Result<T, NegotiationRepositoryError>;

/// Negotiation persistence contract.
#[async_trait]
pub trait NegotiationRepository: Send + Sync {
    /// Stores a new negotiation.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationRepositoryError::DuplicateNegotiation`] when the
    /// identifier already exists.
    async fn store(&self, negotiation: &SwapNegotiation) -> NegotiationRepositoryResult<()>;

    /// Finds a negotiation by identifier.
    ///
    /// Returns `None` when the negotiation does not exist.
    async fn find_by_id(
        &self,
        id: NegotiationId,
    ) -> NegotiationRepositoryResult<Option<SwapNegotiation>>;

    /// Records the terminal outcome of `negotiation` together with the slot
    /// writes that carry it out.
    ///
    /// The outcome is only applied while the stored negotiation is still
    /// `Pending`, and each slot only while its stored revision matches. Either
    /// all three writes land or none does. Implementations must share a
    /// transaction boundary with the slot store.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationRepositoryError::NotFound`] when the negotiation
    /// does not exist, [`NegotiationRepositoryError::AlreadyResolved`] when
    /// another outcome was recorded first, and
    /// [`NegotiationRepositoryError::Slot`] when a slot write is rejected.
    async fn record_resolution(
        &self,
        negotiation: &SwapNegotiation,
        slots: &SlotPairUpdate,
    ) -> NegotiationRepositoryResult<()>;

    /// Returns every negotiation opened by `proposer_id`, newest first.
    async fn list_by_proposer(
        &self,
        proposer_id: UserId,
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>>;

    /// Returns pending negotiations requesting any of `slot_ids`, newest first.
    async fn list_pending_for_requested_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>>;
}

/// Errors returned by negotiation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum NegotiationRepositoryError {
    /// A negotiation with the same identifier already exists.
    #[error("duplicate negotiation identifier: {0}")]
    DuplicateNegotiation(NegotiationId),

    /// The negotiation was not found.
    #[error("negotiation not found: {0}")]
    NotFound(NegotiationId),

    /// The stored negotiation is no longer pending.
    #[error("negotiation {0} was already resolved")]
    AlreadyResolved(NegotiationId),

    /// A slot write inside a resolution was rejected.
    #[error(transparent)]
    Slot(#[from] SlotRepositoryError),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl NegotiationRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
