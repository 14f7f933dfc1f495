//! Slot aggregate root and its typed status transitions.

use super::{SlotDomainError, SlotId, SlotRevision, SlotStatus, SlotTitle, SwapLock, TimeWindow, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Calendar slot aggregate root.
///
/// Every mutation goes through a transition method that validates the
/// current [`SlotStatus`] and advances the [`SlotRevision`], so persistence
/// adapters can reject writes computed from a stale read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    id: SlotId,
    owner_id: UserId,
    title: SlotTitle,
    window: TimeWindow,
    status: SlotStatus,
    swap_lock: Option<SwapLock>,
    revision: SlotRevision,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted slot aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSlotData {
    /// Persisted slot identifier.
    pub id: SlotId,
    /// Persisted current owner.
    pub owner_id: UserId,
    /// Persisted title.
    pub title: SlotTitle,
    /// Persisted time window.
    pub window: TimeWindow,
    /// Persisted tradability status.
    pub status: SlotStatus,
    /// Persisted swap lock, present only while pending a swap.
    pub swap_lock: Option<SwapLock>,
    /// Persisted write revision.
    pub revision: SlotRevision,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Creates a new `Busy` slot owned by `owner_id`.
    #[must_use]
    pub fn new(owner_id: UserId, title: SlotTitle, window: TimeWindow, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: SlotId::new(),
            owner_id,
            title,
            window,
            status: SlotStatus::Busy,
            swap_lock: None,
            revision: SlotRevision::INITIAL,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a slot from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSlotData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            title: data.title,
            window: data.window,
            status: data.status,
            swap_lock: data.swap_lock,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the slot identifier.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Returns the current owner.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the slot title.
    #[must_use]
    pub const fn title(&self) -> &SlotTitle {
        &self.title
    }

    /// Returns the slot time window.
    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        self.window
    }

    /// Returns the tradability status.
    #[must_use]
    pub const fn status(&self) -> SlotStatus {
        self.status
    }

    /// Returns the lock held by the negotiation this slot is pending in.
    #[must_use]
    pub const fn swap_lock(&self) -> Option<SwapLock> {
        self.swap_lock
    }

    /// Returns the write revision.
    #[must_use]
    pub const fn revision(&self) -> SlotRevision {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `user` currently owns this slot.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Checks that `caller` owns this slot.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::NotOwner`] when the caller is not the owner.
    pub fn ensure_owned_by(&self, caller: UserId) -> Result<(), SlotDomainError> {
        if self.is_owned_by(caller) {
            Ok(())
        } else {
            Err(SlotDomainError::NotOwner {
                slot_id: self.id,
                caller,
            })
        }
    }

    /// Sets the slot to `Tradable` or back to `Busy` on behalf of its owner.
    ///
    /// Setting the status the slot already has is accepted and still counts
    /// as a write.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::NotOwner`] for non-owners and
    /// [`SlotDomainError::InvalidTransition`] while the slot is pending a
    /// swap.
    pub fn set_tradable(
        &mut self,
        caller: UserId,
        tradable: bool,
        clock: &impl Clock,
    ) -> Result<(), SlotDomainError> {
        self.ensure_owned_by(caller)?;
        let target = if tradable {
            SlotStatus::Tradable
        } else {
            SlotStatus::Busy
        };
        if self.status == SlotStatus::PendingSwap {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Locks a `Tradable` slot into a negotiation identified by `lock`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::InvalidTransition`] unless the slot is
    /// `Tradable`.
    pub fn lock_for_swap(&mut self, lock: SwapLock, clock: &impl Clock) -> Result<(), SlotDomainError> {
        if self.status != SlotStatus::Tradable {
            return Err(self.invalid_transition(SlotStatus::PendingSwap));
        }
        self.status = SlotStatus::PendingSwap;
        self.swap_lock = Some(lock);
        self.touch(clock);
        Ok(())
    }

    /// Releases a slot held by `lock` back to `Tradable`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::InvalidTransition`] unless the slot is
    /// `PendingSwap`, or [`SlotDomainError::LockMismatch`] when another
    /// negotiation holds it.
    pub fn release_lock(&mut self, lock: SwapLock, clock: &impl Clock) -> Result<(), SlotDomainError> {
        self.ensure_held_by(lock, SlotStatus::Tradable)?;
        self.status = SlotStatus::Tradable;
        self.swap_lock = None;
        self.touch(clock);
        Ok(())
    }

    /// Exchanges the owners of two slots held by the same `lock`.
    ///
    /// Both slots are validated before either is modified; on success both
    /// are `Busy` and unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::InvalidTransition`] or
    /// [`SlotDomainError::LockMismatch`] when either slot is not pending in
    /// the negotiation identified by `lock`. Neither slot changes on error.
    pub fn exchange_owners(
        first: &mut Self,
        second: &mut Self,
        lock: SwapLock,
        clock: &impl Clock,
    ) -> Result<(), SlotDomainError> {
        first.ensure_held_by(lock, SlotStatus::Busy)?;
        second.ensure_held_by(lock, SlotStatus::Busy)?;

        std::mem::swap(&mut first.owner_id, &mut second.owner_id);
        for slot in [first, second] {
            slot.status = SlotStatus::Busy;
            slot.swap_lock = None;
            slot.touch(clock);
        }
        Ok(())
    }

    /// Releases two slots held by the same `lock` back to `Tradable`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::InvalidTransition`] or
    /// [`SlotDomainError::LockMismatch`] when either slot is not pending in
    /// the negotiation identified by `lock`. Neither slot changes on error.
    pub fn release_both(
        first: &mut Self,
        second: &mut Self,
        lock: SwapLock,
        clock: &impl Clock,
    ) -> Result<(), SlotDomainError> {
        first.ensure_held_by(lock, SlotStatus::Tradable)?;
        second.ensure_held_by(lock, SlotStatus::Tradable)?;

        for slot in [first, second] {
            slot.status = SlotStatus::Tradable;
            slot.swap_lock = None;
            slot.touch(clock);
        }
        Ok(())
    }

    /// Edits the title and/or window on behalf of the owner.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::NotOwner`] for non-owners and
    /// [`SlotDomainError::PendingSwap`] while the slot is locked.
    pub fn update_details(
        &mut self,
        caller: UserId,
        title: Option<SlotTitle>,
        window: Option<TimeWindow>,
        clock: &impl Clock,
    ) -> Result<(), SlotDomainError> {
        self.ensure_editable_by(caller)?;
        if let Some(new_title) = title {
            self.title = new_title;
        }
        if let Some(new_window) = window {
            self.window = new_window;
        }
        self.touch(clock);
        Ok(())
    }

    /// Checks that `caller` may edit this slot's title or window.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::NotOwner`] for non-owners and
    /// [`SlotDomainError::PendingSwap`] while the slot is locked.
    pub fn ensure_editable_by(&self, caller: UserId) -> Result<(), SlotDomainError> {
        self.ensure_owned_by(caller)?;
        if !self.status.is_owner_editable() {
            return Err(SlotDomainError::PendingSwap(self.id));
        }
        Ok(())
    }

    /// Checks that `caller` may delete this slot.
    ///
    /// Deletion is allowed exactly when the owner could edit the slot.
    ///
    /// # Errors
    ///
    /// See [`Slot::ensure_editable_by`].
    pub fn ensure_removable_by(&self, caller: UserId) -> Result<(), SlotDomainError> {
        self.ensure_editable_by(caller)
    }

    fn ensure_held_by(&self, lock: SwapLock, target: SlotStatus) -> Result<(), SlotDomainError> {
        if self.status != SlotStatus::PendingSwap {
            return Err(self.invalid_transition(target));
        }
        if self.swap_lock != Some(lock) {
            return Err(SlotDomainError::LockMismatch(self.id));
        }
        Ok(())
    }

    const fn invalid_transition(&self, to: SlotStatus) -> SlotDomainError {
        SlotDomainError::InvalidTransition {
            slot_id: self.id,
            from: self.status,
            to,
        }
    }

    /// Advances the revision and modification timestamp.
    fn touch(&mut self, clock: &impl Clock) {
        self.revision = self.revision.next();
        self.updated_at = clock.utc();
    }
}
