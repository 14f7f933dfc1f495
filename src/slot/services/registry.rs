//! Service layer for slot ownership and tradability.
//!
//! [`SlotRegistryService`] is the only writer of slot state. Each operation
//! reads the slot, applies a typed domain transition and writes it back with a
//! revision check, so concurrent writers on the same slot are linearized: the
//! loser observes [`SlotRegistryError::Conflict`] rather than overwriting.

use crate::error::ErrorKind;
use crate::slot::{
    domain::{
        Slot, SlotDomainError, SlotId, SlotRevision, SlotStatus, SlotTitle, SwapLock, TimeWindow,
        UserId,
    },
    ports::{SlotPairUpdate, SlotRepository, SlotRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Request payload for creating a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSlotRequest {
    owner_id: UserId,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl CreateSlotRequest {
    /// Creates a request for a slot covering `[start, end)`.
    #[must_use]
    pub fn new(
        owner_id: UserId,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            title: title.into(),
            start,
            end,
        }
    }
}

/// Request payload for editing a slot's title or window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSlotDetailsRequest {
    slot_id: SlotId,
    caller_id: UserId,
    title: Option<String>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl UpdateSlotDetailsRequest {
    /// Creates an edit request that changes nothing until fields are set.
    #[must_use]
    pub const fn new(slot_id: SlotId, caller_id: UserId) -> Self {
        Self {
            slot_id,
            caller_id,
            title: None,
            window: None,
        }
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a new window.
    #[must_use]
    pub const fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = Some((start, end));
        self
    }
}

/// Service-level errors for slot registry operations.
#[derive(Debug, Error)]
pub enum SlotRegistryError {
    /// Domain validation or transition failed.
    #[error(transparent)]
    Domain(#[from] SlotDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] SlotRepositoryError),
    /// No slot exists with the given identifier.
    #[error("slot {0} not found")]
    NotFound(SlotId),
    /// The slot changed between read and write.
    #[error("slot {0} was modified concurrently")]
    Conflict(SlotId),
    /// A paired operation named the same slot twice.
    #[error("slot {0} cannot be paired with itself")]
    SelfExchange(SlotId),
}

impl SlotRegistryError {
    /// Returns the stable error category for callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(SlotDomainError::EmptyTitle | SlotDomainError::InvalidWindow)
            | Self::SelfExchange(_) => ErrorKind::InvalidRequest,
            Self::Domain(SlotDomainError::NotOwner { .. }) => ErrorKind::Forbidden,
            Self::Domain(
                SlotDomainError::InvalidTransition { .. }
                | SlotDomainError::LockMismatch(_)
                | SlotDomainError::PendingSwap(_),
            )
            | Self::Conflict(_) => ErrorKind::InvalidTransition,
            Self::NotFound(_) | Self::Repository(SlotRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(SlotRepositoryError::RevisionConflict { .. }) => {
                ErrorKind::InvalidTransition
            }
            Self::Repository(_) => ErrorKind::Persistence,
        }
    }
}

/// Result type for slot registry service operations.
pub type SlotRegistryResult<T> = Result<T, SlotRegistryError>;

/// Slot ownership and status orchestration service.
pub struct SlotRegistryService<R, C>
where
    R: SlotRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for SlotRegistryService<R, C>
where
    R: SlotRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> SlotRegistryService<R, C>
where
    R: SlotRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new slot registry service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates a `Busy` slot owned by the requester.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::Domain`] for an empty title or a window
    /// that does not end after it starts, or repository errors.
    #[instrument(skip(self, request), fields(owner_id = %request.owner_id))]
    pub async fn create_slot(&self, request: CreateSlotRequest) -> SlotRegistryResult<Slot> {
        let CreateSlotRequest {
            owner_id,
            title,
            start,
            end,
        } = request;

        let slot_title = SlotTitle::new(title)?;
        let window = TimeWindow::new(start, end)?;
        let slot = Slot::new(owner_id, slot_title, window, &*self.clock);
        self.repository.store(&slot).await?;
        debug!(slot_id = %slot.id(), "slot created");
        Ok(slot)
    }

    /// Finds a slot by identifier.
    ///
    /// Returns `Ok(None)` when the slot does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::Repository`] when persistence lookup fails.
    pub async fn find_slot(&self, slot_id: SlotId) -> SlotRegistryResult<Option<Slot>> {
        Ok(self.repository.find_by_id(slot_id).await?)
    }

    /// Returns every slot owned by `owner_id`, ordered by window start.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::Repository`] when persistence lookup fails.
    pub async fn list_owned(&self, owner_id: UserId) -> SlotRegistryResult<Vec<Slot>> {
        Ok(self.repository.list_by_owner(owner_id).await?)
    }

    /// Returns a snapshot of all `Tradable` slots not owned by `excluding_owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::Repository`] when persistence lookup fails.
    pub async fn list_tradable(&self, excluding_owner: UserId) -> SlotRegistryResult<Vec<Slot>> {
        let tradable = self.repository.list_by_status(SlotStatus::Tradable).await?;
        Ok(tradable
            .into_iter()
            .filter(|slot| !slot.is_owned_by(excluding_owner))
            .collect())
    }

    /// Edits a slot's title and/or window on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::NotFound`] for unknown slots, domain errors
    /// for non-owners, invalid values, or slots pending a swap, and
    /// [`SlotRegistryError::Conflict`] when the slot changed concurrently.
    #[instrument(skip(self, request), fields(slot_id = %request.slot_id))]
    pub async fn update_details(
        &self,
        request: UpdateSlotDetailsRequest,
    ) -> SlotRegistryResult<Slot> {
        let UpdateSlotDetailsRequest {
            slot_id,
            caller_id,
            title,
            window,
        } = request;

        let new_title = title.map(SlotTitle::new).transpose()?;
        let new_window = window
            .map(|(start, end)| TimeWindow::new(start, end))
            .transpose()?;

        let mut slot = self.find_slot_or_error(slot_id).await?;
        let expected = slot.revision();
        slot.update_details(caller_id, new_title, new_window, &*self.clock)?;
        self.replace(&slot, expected).await?;
        Ok(slot)
    }

    /// Deletes a slot on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::NotFound`] for unknown slots, domain errors
    /// for non-owners or slots pending a swap, and
    /// [`SlotRegistryError::Conflict`] when the slot changed concurrently.
    #[instrument(skip(self))]
    pub async fn delete_slot(&self, slot_id: SlotId, caller_id: UserId) -> SlotRegistryResult<()> {
        let slot = self.find_slot_or_error(slot_id).await?;
        slot.ensure_removable_by(caller_id)?;
        self.repository
            .remove(slot_id, slot.revision())
            .await
            .map_err(|err| map_write_error(slot_id, err))?;
        info!("slot deleted");
        Ok(())
    }

    /// Sets a slot to `Tradable` or `Busy` on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::NotFound`] for unknown slots,
    /// [`SlotDomainError::NotOwner`] for non-owners,
    /// [`SlotDomainError::InvalidTransition`] while the slot is pending a swap,
    /// and [`SlotRegistryError::Conflict`] when the slot changed concurrently.
    #[instrument(skip(self))]
    pub async fn set_tradability(
        &self,
        slot_id: SlotId,
        caller_id: UserId,
        make_tradable: bool,
    ) -> SlotRegistryResult<Slot> {
        let mut slot = self.find_slot_or_error(slot_id).await?;
        let expected = slot.revision();
        slot.set_tradable(caller_id, make_tradable, &*self.clock)?;
        self.replace(&slot, expected).await?;
        debug!(status = %slot.status(), "slot tradability updated");
        Ok(slot)
    }

    /// Locks a `Tradable` slot into the negotiation identified by `lock`.
    ///
    /// At most one of any number of concurrent callers succeeds for the same
    /// slot; the others observe an invalid-transition error.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::NotFound`] for unknown slots,
    /// [`SlotDomainError::InvalidTransition`] unless the slot is `Tradable`,
    /// and [`SlotRegistryError::Conflict`] when another writer won the race.
    #[instrument(skip(self))]
    pub async fn lock_for_swap(&self, slot_id: SlotId, lock: SwapLock) -> SlotRegistryResult<Slot> {
        let mut slot = self.find_slot_or_error(slot_id).await?;
        let expected = slot.revision();
        slot.lock_for_swap(lock, &*self.clock)?;
        self.replace(&slot, expected).await?;
        debug!("slot locked for swap");
        Ok(slot)
    }

    /// Releases a slot held by `lock` back to `Tradable`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::NotFound`] for unknown slots,
    /// [`SlotDomainError::InvalidTransition`] unless the slot is pending,
    /// [`SlotDomainError::LockMismatch`] when another negotiation holds it,
    /// and [`SlotRegistryError::Conflict`] when the slot changed concurrently.
    #[instrument(skip(self))]
    pub async fn release_lock(&self, slot_id: SlotId, lock: SwapLock) -> SlotRegistryResult<Slot> {
        let mut slot = self.find_slot_or_error(slot_id).await?;
        let expected = slot.revision();
        slot.release_lock(lock, &*self.clock)?;
        self.replace(&slot, expected).await?;
        debug!("slot lock released");
        Ok(slot)
    }

    /// Exchanges the owners of two slots held by `lock` and marks both `Busy`.
    ///
    /// The exchange is all-or-nothing: both slots are validated before either
    /// changes and both are written in a single repository operation.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::SelfExchange`] when both identifiers are
    /// equal, [`SlotRegistryError::NotFound`] for unknown slots, domain errors
    /// unless both slots are pending under `lock`, and
    /// [`SlotRegistryError::Conflict`] when either changed concurrently.
    #[instrument(skip(self))]
    pub async fn commit_exchange(
        &self,
        slot_a: SlotId,
        slot_b: SlotId,
        lock: SwapLock,
    ) -> SlotRegistryResult<(Slot, Slot)> {
        let update = self.plan_exchange(slot_a, slot_b, lock).await?;
        self.write_pair(&update).await?;
        info!("slot ownership exchanged");
        Ok(update.into_slots())
    }

    /// Releases two slots held by `lock` back to `Tradable` in one write.
    ///
    /// # Errors
    ///
    /// Returns [`SlotRegistryError::SelfExchange`] when both identifiers are
    /// equal, [`SlotRegistryError::NotFound`] for unknown slots, domain errors
    /// unless both slots are pending under `lock`, and
    /// [`SlotRegistryError::Conflict`] when either changed concurrently.
    /// Neither slot changes on error.
    #[instrument(skip(self))]
    pub async fn release_pair(
        &self,
        slot_a: SlotId,
        slot_b: SlotId,
        lock: SwapLock,
    ) -> SlotRegistryResult<(Slot, Slot)> {
        let update = self.plan_release_pair(slot_a, slot_b, lock).await?;
        self.write_pair(&update).await?;
        debug!("slot pair released");
        Ok(update.into_slots())
    }

    /// Validates an owner exchange and returns the writes without applying
    /// them.
    ///
    /// Used when the exchange must be stored together with other records.
    ///
    /// # Errors
    ///
    /// As [`SlotRegistryService::commit_exchange`], except that no write is
    /// attempted.
    pub async fn plan_exchange(
        &self,
        slot_a: SlotId,
        slot_b: SlotId,
        lock: SwapLock,
    ) -> SlotRegistryResult<SlotPairUpdate> {
        let (mut first, mut second) = self.load_pair(slot_a, slot_b).await?;
        let first_expected = first.revision();
        let second_expected = second.revision();
        Slot::exchange_owners(&mut first, &mut second, lock, &*self.clock)?;
        Ok(SlotPairUpdate::new(first, first_expected, second, second_expected))
    }

    /// Validates releasing both slots and returns the writes without applying
    /// them.
    ///
    /// # Errors
    ///
    /// As [`SlotRegistryService::release_pair`], except that no write is
    /// attempted.
    pub async fn plan_release_pair(
        &self,
        slot_a: SlotId,
        slot_b: SlotId,
        lock: SwapLock,
    ) -> SlotRegistryResult<SlotPairUpdate> {
        let (mut first, mut second) = self.load_pair(slot_a, slot_b).await?;
        let first_expected = first.revision();
        let second_expected = second.revision();
        Slot::release_both(&mut first, &mut second, lock, &*self.clock)?;
        Ok(SlotPairUpdate::new(first, first_expected, second, second_expected))
    }

    async fn load_pair(&self, slot_a: SlotId, slot_b: SlotId) -> SlotRegistryResult<(Slot, Slot)> {
        if slot_a == slot_b {
            return Err(SlotRegistryError::SelfExchange(slot_a));
        }
        let first = self.find_slot_or_error(slot_a).await?;
        let second = self.find_slot_or_error(slot_b).await?;
        Ok((first, second))
    }

    async fn write_pair(&self, update: &SlotPairUpdate) -> SlotRegistryResult<()> {
        let (first, _) = update.first();
        self.repository
            .replace_pair(update.first(), update.second())
            .await
            .map_err(|err| map_write_error(first.id(), err))
    }

    async fn find_slot_or_error(&self, slot_id: SlotId) -> SlotRegistryResult<Slot> {
        self.repository
            .find_by_id(slot_id)
            .await?
            .ok_or(SlotRegistryError::NotFound(slot_id))
    }

    async fn replace(&self, slot: &Slot, expected: SlotRevision) -> SlotRegistryResult<()> {
        self.repository
            .replace(slot, expected)
            .await
            .map_err(|err| map_write_error(slot.id(), err))
    }
}

/// Maps repository write failures onto registry errors.
///
/// A slot that vanished or changed between read and write lost a race; both
/// are reported to the caller without retrying.
fn map_write_error(slot_id: SlotId, err: SlotRepositoryError) -> SlotRegistryError {
    match err {
        SlotRepositoryError::NotFound(id) => SlotRegistryError::NotFound(id),
        SlotRepositoryError::RevisionConflict { id, .. } => SlotRegistryError::Conflict(id),
        other => {
            debug!(%slot_id, error = %other, "slot write failed");
            SlotRegistryError::Repository(other)
        }
    }
}
