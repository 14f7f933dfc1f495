//! When steps for swap negotiation BDD scenarios.

use super::world::{SwapWorld, run_async};
use rstest_bdd_macros::when;
use slotswap::slot::domain::{SlotId, UserId};
use slotswap::swap::services::{ProposeSwapRequest, ResolveSwapRequest};

fn propose(world: &mut SwapWorld, proposer: UserId, offered: SlotId, requested: SlotId) {
    let result = run_async(
        world
            .negotiator
            .propose(ProposeSwapRequest::new(proposer, offered, requested)),
    );
    match result {
        Ok(negotiation) => world.negotiation = Some(negotiation),
        Err(err) => world.last_error = Some(err.kind()),
    }
}

fn resolve(world: &mut SwapWorld, resolver: &str, accept: bool) -> eyre::Result<()> {
    let request = ResolveSwapRequest::new(
        world.user(resolver),
        world.current_negotiation()?.id(),
        accept,
    );
    match run_async(world.negotiator.resolve(request)) {
        Ok(resolved) => world.negotiation = Some(resolved),
        Err(err) => world.last_error = Some(err.kind()),
    }
    Ok(())
}

#[when(r#""{proposer}" proposes swapping "{offered}" for "{requested}""#)]
fn proposes(
    world: &mut SwapWorld,
    proposer: String,
    offered: String,
    requested: String,
) -> eyre::Result<()> {
    let proposer_id = world.user(&proposer);
    let offered_id = world.slot_id(&offered)?;
    let requested_id = world.slot_id(&requested)?;
    propose(world, proposer_id, offered_id, requested_id);
    Ok(())
}

#[when(r#""{proposer}" proposes swapping "{offered}" for an unknown slot"#)]
fn proposes_for_unknown(world: &mut SwapWorld, proposer: String, offered: String) -> eyre::Result<()> {
    let proposer_id = world.user(&proposer);
    let offered_id = world.slot_id(&offered)?;
    propose(world, proposer_id, offered_id, SlotId::new());
    Ok(())
}

#[when(r#""{resolver}" accepts the swap"#)]
fn accepts(world: &mut SwapWorld, resolver: String) -> eyre::Result<()> {
    resolve(world, &resolver, true)
}

#[when(r#""{resolver}" rejects the swap"#)]
fn rejects(world: &mut SwapWorld, resolver: String) -> eyre::Result<()> {
    resolve(world, &resolver, false)
}

#[when(r#""{first}" offering "{first_slot}" and "{second}" offering "{second_slot}" both request "{requested}""#)]
fn competing_proposals(
    world: &mut SwapWorld,
    first: String,
    first_slot: String,
    second: String,
    second_slot: String,
    requested: String,
) -> eyre::Result<()> {
    let requested_id = world.slot_id(&requested)?;
    let offers = [
        (world.user(&first), world.slot_id(&first_slot)?),
        (world.user(&second), world.slot_id(&second_slot)?),
    ];

    let handles: Vec<_> = offers
        .into_iter()
        .map(|(proposer, offered)| {
            let negotiator = world.negotiator.clone();
            let request = ProposeSwapRequest::new(proposer, offered, requested_id);
            (
                offered,
                tokio::spawn(async move { negotiator.propose(request).await }),
            )
        })
        .collect();

    for (offered, handle) in handles {
        let result = run_async(handle)?.map_err(|err| err.kind());
        world.attempts.push((offered, result));
    }
    Ok(())
}
