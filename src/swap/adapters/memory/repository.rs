//! In-memory repository for swap negotiations.

use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::slot::{
    adapters::memory::InMemorySlotRepository,
    domain::{SlotId, UserId},
    ports::SlotPairUpdate,
};
use crate::swap::{
    domain::{NegotiationId, SwapNegotiation, SwapOutcome},
    ports::{NegotiationRepository, NegotiationRepositoryError, NegotiationRepositoryResult},
};

/// Thread-safe in-memory negotiation repository.
///
/// Resolutions write to the slot store the repository was created with. The
/// slot lock is always taken before the negotiation lock.
#[derive(Debug, Clone)]
pub struct InMemoryNegotiationRepository {
    state: Arc<RwLock<HashMap<NegotiationId, SwapNegotiation>>>,
    slots: InMemorySlotRepository,
}

impl InMemoryNegotiationRepository {
    /// Creates an empty repository resolving against `slots`.
    #[must_use]
    pub fn new(slots: &InMemorySlotRepository) -> Self {
        Self {
            state: Arc::default(),
            slots: slots.clone(),
        }
    }

    fn read(
        &self,
    ) -> NegotiationRepositoryResult<RwLockReadGuard<'_, HashMap<NegotiationId, SwapNegotiation>>>
    {
        self.state.read().map_err(|err| {
            NegotiationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> NegotiationRepositoryResult<RwLockWriteGuard<'_, HashMap<NegotiationId, SwapNegotiation>>>
    {
        self.state.write().map_err(|err| {
            NegotiationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn collect_newest_first(
        &self,
        predicate: impl Fn(&SwapNegotiation) -> bool,
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>> {
        let state = self.read()?;
        let mut matching: Vec<SwapNegotiation> = state
            .values()
            .filter(|negotiation| predicate(negotiation))
            .cloned()
            .collect();
        matching.sort_by_key(|negotiation| {
            (Reverse(negotiation.created_at()), negotiation.id().into_inner())
        });
        Ok(matching)
    }
}

#[async_trait]
impl NegotiationRepository for InMemoryNegotiationRepository {
    async fn store(&self, negotiation: &SwapNegotiation) -> NegotiationRepositoryResult<()> {
        let mut state = self.write()?;
        if state.contains_key(&negotiation.id()) {
            return Err(NegotiationRepositoryError::DuplicateNegotiation(
                negotiation.id(),
            ));
        }
        state.insert(negotiation.id(), negotiation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: NegotiationId,
    ) -> NegotiationRepositoryResult<Option<SwapNegotiation>> {
        let state = self.read()?;
        Ok(state.get(&id).cloned())
    }

    async fn record_resolution(
        &self,
        negotiation: &SwapNegotiation,
        slots: &SlotPairUpdate,
    ) -> NegotiationRepositoryResult<()> {
        let id = negotiation.id();
        self.slots.replace_pair_with(slots, || {
            let mut state = self.write()?;
            let stored = state
                .get_mut(&id)
                .ok_or(NegotiationRepositoryError::NotFound(id))?;
            if stored.outcome() != SwapOutcome::Pending {
                return Err(NegotiationRepositoryError::AlreadyResolved(id));
            }
            *stored = negotiation.clone();
            Ok(())
        })
    }

    async fn list_by_proposer(
        &self,
        proposer_id: UserId,
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>> {
        self.collect_newest_first(|negotiation| negotiation.proposer_id() == proposer_id)
    }

    async fn list_pending_for_requested_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> NegotiationRepositoryResult<Vec<SwapNegotiation>> {
        self.collect_newest_first(|negotiation| {
            negotiation.outcome() == SwapOutcome::Pending
                && slot_ids.contains(&negotiation.requested_slot_id())
        })
    }
}
