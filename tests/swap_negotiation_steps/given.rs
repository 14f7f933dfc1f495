//! Given steps for swap negotiation BDD scenarios.

use super::world::{SwapWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use slotswap::swap::services::{ProposeSwapRequest, ResolveSwapRequest};

#[given(r#""{owner}" owns a tradable slot "{name}""#)]
fn owns_tradable_slot(world: &mut SwapWorld, owner: String, name: String) -> eyre::Result<()> {
    world.create_slot(&owner, &name, true)
}

#[given(r#""{owner}" owns a busy slot "{name}""#)]
fn owns_busy_slot(world: &mut SwapWorld, owner: String, name: String) -> eyre::Result<()> {
    world.create_slot(&owner, &name, false)
}

#[given(r#""{proposer}" has proposed swapping "{offered}" for "{requested}""#)]
fn has_proposed(
    world: &mut SwapWorld,
    proposer: String,
    offered: String,
    requested: String,
) -> eyre::Result<()> {
    let request = ProposeSwapRequest::new(
        world.user(&proposer),
        world.slot_id(&offered)?,
        world.slot_id(&requested)?,
    );
    let negotiation = run_async(world.negotiator.propose(request))
        .wrap_err("propose swap in scenario setup")?;
    world.negotiation = Some(negotiation);
    Ok(())
}

#[given(r#""{resolver}" has rejected the swap"#)]
fn has_rejected(world: &mut SwapWorld, resolver: String) -> eyre::Result<()> {
    let request = ResolveSwapRequest::reject(world.user(&resolver), world.current_negotiation()?.id());
    let resolved = run_async(world.negotiator.resolve(request))
        .wrap_err("reject swap in scenario setup")?;
    world.negotiation = Some(resolved);
    Ok(())
}
