//! Slot storage and revision checks against `PostgreSQL`.

use super::helpers::{BoxError, new_slot, test_pool};
use mockable::DefaultClock;
use rstest::rstest;
use slotswap::slot::{
    adapters::postgres::PostgresSlotRepository,
    domain::{SlotId, SlotStatus, SwapLock, UserId},
    ports::{SlotRepository, SlotRepositoryError},
};
use uuid::Uuid;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_slot_round_trips_with_lock() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repo = PostgresSlotRepository::new(pool);
    let owner = UserId::new();
    let mut slot = new_slot(owner, 9)?;
    repo.store(&slot).await?;

    let expected = slot.revision();
    slot.set_tradable(owner, true, &DefaultClock)?;
    slot.lock_for_swap(SwapLock::from_uuid(Uuid::new_v4()), &DefaultClock)?;
    repo.replace(&slot, expected).await?;

    let loaded = repo.find_by_id(slot.id()).await?;
    assert_eq!(loaded.as_ref().map(|found| found.status()), Some(SlotStatus::PendingSwap));
    assert_eq!(loaded.as_ref().and_then(|found| found.swap_lock()), slot.swap_lock());
    assert_eq!(loaded.map(|found| found.revision()), Some(slot.revision()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_store_is_rejected() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repo = PostgresSlotRepository::new(pool);
    let slot = new_slot(UserId::new(), 9)?;
    repo.store(&slot).await?;

    let result = repo.store(&slot).await;
    assert!(matches!(result, Err(SlotRepositoryError::DuplicateSlot(id)) if id == slot.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_and_missing_writes_are_distinguished() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repo = PostgresSlotRepository::new(pool);
    let owner = UserId::new();
    let original = new_slot(owner, 9)?;
    repo.store(&original).await?;

    let mut updated = original.clone();
    updated.set_tradable(owner, true, &DefaultClock)?;
    repo.replace(&updated, original.revision()).await?;

    let stale = repo.replace(&updated, original.revision()).await;
    assert!(matches!(stale, Err(SlotRepositoryError::RevisionConflict { .. })));

    let missing = new_slot(owner, 10)?;
    let absent = repo.replace(&missing, missing.revision()).await;
    assert!(matches!(absent, Err(SlotRepositoryError::NotFound(id)) if id == missing.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn paired_replace_is_all_or_nothing() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repo = PostgresSlotRepository::new(pool);
    let owner = UserId::new();
    let first = new_slot(owner, 9)?;
    let second = new_slot(owner, 10)?;
    repo.store(&first).await?;
    repo.store(&second).await?;

    let mut first_next = first.clone();
    let mut second_next = second.clone();
    first_next.set_tradable(owner, true, &DefaultClock)?;
    second_next.set_tradable(owner, true, &DefaultClock)?;
    let wrong_revision = second_next.revision();

    let result = repo
        .replace_pair(
            (&first_next, first.revision()),
            (&second_next, wrong_revision),
        )
        .await;
    assert!(matches!(result, Err(SlotRepositoryError::RevisionConflict { .. })));

    // Timestamps lose sub-microsecond precision in storage, so compare the
    // fields the transaction guards.
    let stored_first = repo.find_by_id(first.id()).await?;
    assert_eq!(stored_first.as_ref().map(|slot| slot.revision()), Some(first.revision()));
    assert_eq!(stored_first.map(|slot| slot.status()), Some(SlotStatus::Busy));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_filter_and_order_by_start() -> Result<(), BoxError> {
    let Some(pool) = test_pool()? else {
        return Ok(());
    };
    let repo = PostgresSlotRepository::new(pool);
    let owner = UserId::new();
    let late = new_slot(owner, 15)?;
    let early = new_slot(owner, 8)?;
    repo.store(&late).await?;
    repo.store(&early).await?;

    let owned: Vec<SlotId> = repo
        .list_by_owner(owner)
        .await?
        .iter()
        .map(|slot| slot.id())
        .collect();
    assert_eq!(owned, vec![early.id(), late.id()]);

    repo.remove(late.id(), late.revision()).await?;
    assert_eq!(repo.find_by_id(late.id()).await?, None);
    Ok(())
}
