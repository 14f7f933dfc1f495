//! Ownership checks across registry and negotiator entry points.

use super::helpers::{BoxError, MemoryNegotiator, load, negotiator, runtime, tradable_slot};
use rstest::rstest;
use slotswap::error::ErrorKind;
use slotswap::slot::{
    domain::{SlotStatus, UserId},
    services::UpdateSlotDetailsRequest,
};
use slotswap::swap::services::{ProposeSwapRequest, ResolveSwapRequest};
use std::io;
use tokio::runtime::Runtime;

#[rstest]
fn offering_a_foreign_slot_changes_nothing(
    runtime: io::Result<Runtime>,
    negotiator: MemoryNegotiator,
) -> Result<(), BoxError> {
    let rt = runtime?;
    let (alice, bob, carol) = (UserId::new(), UserId::new(), UserId::new());
    let s1 = rt.block_on(tradable_slot(&negotiator, bob, 9))?;
    let s2 = rt.block_on(tradable_slot(&negotiator, carol, 10))?;

    let result = rt.block_on(negotiator.propose(ProposeSwapRequest::new(alice, s1.id(), s2.id())));
    let err = result.err().ok_or("foreign offer must be refused")?;
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert_eq!(rt.block_on(load(&negotiator, s1.id()))?, s1);
    assert_eq!(rt.block_on(load(&negotiator, s2.id()))?, s2);
    Ok(())
}

#[rstest]
#[case::proposer(true)]
#[case::stranger(false)]
fn only_requested_owner_resolves(
    runtime: io::Result<Runtime>,
    negotiator: MemoryNegotiator,
    #[case] as_proposer: bool,
) -> Result<(), BoxError> {
    let rt = runtime?;
    let (alice, bob) = (UserId::new(), UserId::new());
    let s1 = rt.block_on(tradable_slot(&negotiator, alice, 9))?;
    let s2 = rt.block_on(tradable_slot(&negotiator, bob, 10))?;
    let pending =
        rt.block_on(negotiator.propose(ProposeSwapRequest::new(alice, s1.id(), s2.id())))?;

    let caller = if as_proposer { alice } else { UserId::new() };
    let result = rt.block_on(negotiator.resolve(ResolveSwapRequest::accept(caller, pending.id())));
    let err = result.err().ok_or("resolution by non-owner must fail")?;
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert_eq!(
        rt.block_on(load(&negotiator, s2.id()))?.owner_id(),
        bob,
        "ownership must not move"
    );
    Ok(())
}

#[rstest]
fn locked_slot_rejects_owner_changes(
    runtime: io::Result<Runtime>,
    negotiator: MemoryNegotiator,
) -> Result<(), BoxError> {
    let rt = runtime?;
    let (alice, bob) = (UserId::new(), UserId::new());
    let s1 = rt.block_on(tradable_slot(&negotiator, alice, 9))?;
    let s2 = rt.block_on(tradable_slot(&negotiator, bob, 10))?;
    rt.block_on(negotiator.propose(ProposeSwapRequest::new(alice, s1.id(), s2.id())))?;
    let registry = negotiator.registry();

    let toggle = rt.block_on(registry.set_tradability(s1.id(), alice, false));
    let edit = rt.block_on(
        registry.update_details(UpdateSlotDetailsRequest::new(s1.id(), alice).with_title("Mine")),
    );
    let delete = rt.block_on(registry.delete_slot(s1.id(), alice));

    for kind in [
        toggle.err().map(|err| err.kind()),
        edit.err().map(|err| err.kind()),
        delete.err().map(|err| err.kind()),
    ] {
        assert_eq!(kind, Some(ErrorKind::InvalidTransition));
    }
    assert_eq!(
        rt.block_on(load(&negotiator, s1.id()))?.status(),
        SlotStatus::PendingSwap
    );
    Ok(())
}
