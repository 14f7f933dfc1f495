//! End-to-end negotiation over `PostgreSQL` storage.

use super::helpers::{BoxError, at_hour, test_pool};
use chrono::Duration;
use mockable::DefaultClock;
use rstest::rstest;
use slotswap::error::ErrorKind;
use slotswap::slot::{
    adapters::postgres::PostgresSlotRepository,
    domain::{Slot, SlotStatus, UserId},
    services::{CreateSlotRequest, SlotRegistryService},
};
use slotswap::swap::{
    adapters::postgres::PostgresNegotiationRepository,
    domain::SwapOutcome,
    services::{ProposeSwapRequest, ResolveSwapRequest, SwapNegotiator},
};
use std::sync::Arc;

type PgNegotiator =
    SwapNegotiator<PostgresSlotRepository, PostgresNegotiationRepository, DefaultClock>;

async fn tradable(
    negotiator: &PgNegotiator,
    owner: UserId,
    hour: u32,
) -> Result<Slot, BoxError> {
    let start = at_hour(hour)?;
    let slot = negotiator
        .registry()
        .create_slot(CreateSlotRequest::new(owner, "Shift", start, start + Duration::hours(1)))
        .await?;
    Ok(negotiator
        .registry()
        .set_tradability(slot.id(), owner, true)
        .await?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_swap_is_durable_and_final() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let clock = Arc::new(DefaultClock);
    let registry =
        SlotRegistryService::new(Arc::new(PostgresSlotRepository::new(pool.clone())), clock.clone());
    let negotiator = SwapNegotiator::new(
        registry,
        Arc::new(PostgresNegotiationRepository::new(pool)),
        clock,
    );

    let (alice, bob) = (UserId::new(), UserId::new());
    let s1 = tradable(&negotiator, alice, 9).await?;
    let s2 = tradable(&negotiator, bob, 10).await?;
    let pending = negotiator
        .propose(ProposeSwapRequest::new(alice, s1.id(), s2.id()))
        .await?;
    assert_eq!(negotiator.list_incoming(bob).await?.len(), 1);

    let accepted = negotiator
        .resolve(ResolveSwapRequest::accept(bob, pending.id()))
        .await?;
    assert_eq!(accepted.outcome(), SwapOutcome::Accepted);

    let swapped = negotiator.registry().find_slot(s1.id()).await?;
    assert_eq!(swapped.as_ref().map(|slot| slot.owner_id()), Some(bob));
    assert_eq!(swapped.map(|slot| slot.status()), Some(SlotStatus::Busy));

    let second = negotiator
        .resolve(ResolveSwapRequest::reject(bob, pending.id()))
        .await;
    assert_eq!(
        second.err().map(|err| err.kind()),
        Some(ErrorKind::InvalidTransition)
    );
    Ok(())
}
