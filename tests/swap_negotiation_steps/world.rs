//! Shared world state for swap negotiation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use eyre::{WrapErr, eyre};
use mockable::DefaultClock;
use rstest::fixture;
use slotswap::error::ErrorKind;
use slotswap::slot::{
    adapters::memory::InMemorySlotRepository,
    domain::{Slot, SlotId, UserId},
    services::{CreateSlotRequest, SlotRegistryService},
};
use slotswap::swap::{
    adapters::memory::InMemoryNegotiationRepository, domain::SwapNegotiation,
    services::SwapNegotiator,
};

/// Negotiator type used by the BDD world.
pub type TestNegotiator =
    SwapNegotiator<InMemorySlotRepository, InMemoryNegotiationRepository, DefaultClock>;

/// Outcome of one proposal attempt, keyed by the slot it offered.
pub type ProposalAttempt = (SlotId, Result<SwapNegotiation, ErrorKind>);

/// Scenario world for swap negotiation behaviour tests.
pub struct SwapWorld {
    pub negotiator: TestNegotiator,
    pub users: HashMap<String, UserId>,
    pub slots: HashMap<String, SlotId>,
    pub negotiation: Option<SwapNegotiation>,
    pub last_error: Option<ErrorKind>,
    pub attempts: Vec<ProposalAttempt>,
    next_hour: u32,
}

impl SwapWorld {
    /// Creates a world over empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let slots = InMemorySlotRepository::new();
        let negotiations = InMemoryNegotiationRepository::new(&slots);
        let registry = SlotRegistryService::new(Arc::new(slots), clock.clone());
        Self {
            negotiator: SwapNegotiator::new(registry, Arc::new(negotiations), clock),
            users: HashMap::new(),
            slots: HashMap::new(),
            negotiation: None,
            last_error: None,
            attempts: Vec::new(),
            next_hour: 8,
        }
    }

    /// Returns the identity for a named user, creating it on first use.
    pub fn user(&mut self, name: &str) -> UserId {
        *self.users.entry(name.to_owned()).or_insert_with(UserId::new)
    }

    /// Returns the identifier of a named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if no slot with that name was created.
    pub fn slot_id(&self, name: &str) -> eyre::Result<SlotId> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| eyre!("no slot named {name} in scenario world"))
    }

    /// Loads the current state of a named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is unknown or lookup fails.
    pub fn load_slot(&self, name: &str) -> eyre::Result<Slot> {
        let slot_id = self.slot_id(name)?;
        run_async(self.negotiator.registry().find_slot(slot_id))
            .wrap_err_with(|| format!("load slot {name}"))?
            .ok_or_else(|| eyre!("slot {name} vanished"))
    }

    /// Creates a named one-hour slot for `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if creation or the tradability toggle fails.
    pub fn create_slot(&mut self, owner: &str, name: &str, tradable: bool) -> eyre::Result<()> {
        let owner_id = self.user(owner);
        let start = Utc
            .with_ymd_and_hms(2026, 11, 2, self.next_hour, 0, 0)
            .single()
            .ok_or_else(|| eyre!("scenario ran out of calendar hours"))?;
        self.next_hour += 1;

        let registry = self.negotiator.registry();
        let slot = run_async(registry.create_slot(CreateSlotRequest::new(
            owner_id,
            name,
            start,
            start + Duration::hours(1),
        )))
        .wrap_err_with(|| format!("create slot {name}"))?;
        if tradable {
            run_async(registry.set_tradability(slot.id(), owner_id, true))
                .wrap_err_with(|| format!("mark slot {name} tradable"))?;
        }
        self.slots.insert(name.to_owned(), slot.id());
        Ok(())
    }

    /// Returns the negotiation opened earlier in the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if no proposal has succeeded yet.
    pub fn current_negotiation(&self) -> eyre::Result<&SwapNegotiation> {
        self.negotiation
            .as_ref()
            .ok_or_else(|| eyre!("missing negotiation in scenario world"))
    }
}

impl Default for SwapWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SwapWorld {
    SwapWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
