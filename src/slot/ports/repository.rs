//! Repository port for slot persistence with optimistic concurrency.

use crate::slot::domain::{Slot, SlotId, SlotRevision, SlotStatus, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for slot repository operations.
pub type SlotRepositoryResult<T> = Result<T, SlotRepositoryError>;

/// Slot persistence contract.
///
/// Writes are compare-and-swap operations keyed on [`SlotRevision`]: an
/// implementation must only apply a write when the stored revision equals the
/// expected one, and must apply paired writes all-or-nothing.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Stores a new slot.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRepositoryError::DuplicateSlot`] when the slot ID
    /// already exists.
    async fn store(&self, slot: &Slot) -> SlotRepositoryResult<()>;

    /// Finds a slot by identifier.
    ///
    /// Returns `None` when the slot does not exist.
    async fn find_by_id(&self, id: SlotId) -> SlotRepositoryResult<Option<Slot>>;

    /// Returns every slot owned by `owner_id`, ordered by window start.
    async fn list_by_owner(&self, owner_id: UserId) -> SlotRepositoryResult<Vec<Slot>>;

    /// Returns every slot with the given status, ordered by window start.
    async fn list_by_status(&self, status: SlotStatus) -> SlotRepositoryResult<Vec<Slot>>;

    /// Replaces a stored slot if its stored revision is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRepositoryError::NotFound`] when the slot does not exist
    /// or [`SlotRepositoryError::RevisionConflict`] when it was modified
    /// concurrently.
    async fn replace(&self, slot: &Slot, expected: SlotRevision) -> SlotRepositoryResult<()>;

    /// Replaces two stored slots atomically.
    ///
    /// Either both writes are applied or neither is.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRepositoryError::NotFound`] or
    /// [`SlotRepositoryError::RevisionConflict`] for whichever slot fails its
    /// check; in that case neither slot is modified.
    async fn replace_pair(
        &self,
        first: (&Slot, SlotRevision),
        second: (&Slot, SlotRevision),
    ) -> SlotRepositoryResult<()>;

    /// Removes a slot if its stored revision is `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRepositoryError::NotFound`] when the slot does not exist
    /// or [`SlotRepositoryError::RevisionConflict`] when it was modified
    /// concurrently.
    async fn remove(&self, id: SlotId, expected: SlotRevision) -> SlotRepositoryResult<()>;
}

/// Two slot writes that must land together, each paired with the revision
/// it replaces.
///
/// Built by the slot registry after validating both transitions; nothing is
/// written until a repository applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPairUpdate {
    first: Slot,
    first_expected: SlotRevision,
    second: Slot,
    second_expected: SlotRevision,
}

impl SlotPairUpdate {
    /// Pairs two updated slots with the revisions they were read at.
    #[must_use]
    pub const fn new(
        first: Slot,
        first_expected: SlotRevision,
        second: Slot,
        second_expected: SlotRevision,
    ) -> Self {
        Self {
            first,
            first_expected,
            second,
            second_expected,
        }
    }

    /// Returns the first write and its expected revision.
    #[must_use]
    pub const fn first(&self) -> (&Slot, SlotRevision) {
        (&self.first, self.first_expected)
    }

    /// Returns the second write and its expected revision.
    #[must_use]
    pub const fn second(&self) -> (&Slot, SlotRevision) {
        (&self.second, self.second_expected)
    }

    /// Consumes the update, returning both slots as they will be stored.
    #[must_use]
    pub fn into_slots(self) -> (Slot, Slot) {
        (self.first, self.second)
    }
}

/// Errors returned by slot repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SlotRepositoryError {
    /// A slot with the same identifier already exists.
    #[error("duplicate slot identifier: {0}")]
    DuplicateSlot(SlotId),

    /// The slot was not found.
    #[error("slot not found: {0}")]
    NotFound(SlotId),

    /// The stored slot changed since it was read.
    #[error("slot {id} was modified concurrently (expected revision {expected})")]
    RevisionConflict {
        /// Slot whose write was rejected.
        id: SlotId,
        /// Revision the writer expected to find.
        expected: SlotRevision,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SlotRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
