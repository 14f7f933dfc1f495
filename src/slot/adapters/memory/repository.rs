//! In-memory repository for slot registry tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::slot::{
    domain::{Slot, SlotId, SlotRevision, SlotStatus, UserId},
    ports::{SlotPairUpdate, SlotRepository, SlotRepositoryError, SlotRepositoryResult},
};

/// Thread-safe in-memory slot repository.
///
/// A single write lock covers every mutation, which makes revision checks
/// and paired replacements atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemorySlotRepository {
    state: Arc<RwLock<InMemorySlotState>>,
}

#[derive(Debug, Default)]
struct InMemorySlotState {
    slots: HashMap<SlotId, Slot>,
}

impl InMemorySlotRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `update` only if both revisions match and `also` succeeds.
    ///
    /// `also` runs while the slot write lock is held, so callers that take
    /// their own lock inside it always acquire locks in the same order.
    pub(crate) fn replace_pair_with<E>(
        &self,
        update: &SlotPairUpdate,
        also: impl FnOnce() -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<SlotRepositoryError>,
    {
        let (first, first_expected) = update.first();
        let (second, second_expected) = update.second();

        let mut state = self.write()?;
        state.check_revision(first.id(), first_expected)?;
        state.check_revision(second.id(), second_expected)?;
        also()?;
        state.slots.insert(first.id(), first.clone());
        state.slots.insert(second.id(), second.clone());
        Ok(())
    }

    fn read(&self) -> SlotRepositoryResult<RwLockReadGuard<'_, InMemorySlotState>> {
        self.state.read().map_err(|err| {
            SlotRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> SlotRepositoryResult<RwLockWriteGuard<'_, InMemorySlotState>> {
        self.state.write().map_err(|err| {
            SlotRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemorySlotState {
    fn check_revision(&self, id: SlotId, expected: SlotRevision) -> SlotRepositoryResult<()> {
        let stored = self
            .slots
            .get(&id)
            .ok_or(SlotRepositoryError::NotFound(id))?;
        if stored.revision() != expected {
            return Err(SlotRepositoryError::RevisionConflict { id, expected });
        }
        Ok(())
    }

    fn collect_sorted(&self, predicate: impl Fn(&Slot) -> bool) -> Vec<Slot> {
        let mut matching: Vec<Slot> = self
            .slots
            .values()
            .filter(|slot| predicate(*slot))
            .cloned()
            .collect();
        matching.sort_by_key(|slot| (slot.window().start(), slot.id()));
        matching
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn store(&self, slot: &Slot) -> SlotRepositoryResult<()> {
        let mut state = self.write()?;
        if state.slots.contains_key(&slot.id()) {
            return Err(SlotRepositoryError::DuplicateSlot(slot.id()));
        }
        state.slots.insert(slot.id(), slot.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: SlotId) -> SlotRepositoryResult<Option<Slot>> {
        let state = self.read()?;
        Ok(state.slots.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner_id: UserId) -> SlotRepositoryResult<Vec<Slot>> {
        let state = self.read()?;
        Ok(state.collect_sorted(|slot| slot.owner_id() == owner_id))
    }

    async fn list_by_status(&self, status: SlotStatus) -> SlotRepositoryResult<Vec<Slot>> {
        let state = self.read()?;
        Ok(state.collect_sorted(|slot| slot.status() == status))
    }

    async fn replace(&self, slot: &Slot, expected: SlotRevision) -> SlotRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_revision(slot.id(), expected)?;
        state.slots.insert(slot.id(), slot.clone());
        Ok(())
    }

    async fn replace_pair(
        &self,
        first: (&Slot, SlotRevision),
        second: (&Slot, SlotRevision),
    ) -> SlotRepositoryResult<()> {
        let (first_slot, first_expected) = first;
        let (second_slot, second_expected) = second;

        let mut state = self.write()?;
        state.check_revision(first_slot.id(), first_expected)?;
        state.check_revision(second_slot.id(), second_expected)?;
        state.slots.insert(first_slot.id(), first_slot.clone());
        state.slots.insert(second_slot.id(), second_slot.clone());
        Ok(())
    }

    async fn remove(&self, id: SlotId, expected: SlotRevision) -> SlotRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_revision(id, expected)?;
        state.slots.remove(&id);
        Ok(())
    }
}
