//! Then steps for swap negotiation BDD scenarios.

use super::world::SwapWorld;
use eyre::{bail, eyre};
use rstest_bdd_macros::then;
use slotswap::slot::domain::SlotStatus;
use slotswap::swap::domain::SwapOutcome;

#[then(r#"the swap is "{outcome}""#)]
fn swap_is(world: &SwapWorld, outcome: String) -> eyre::Result<()> {
    let expected = SwapOutcome::try_from(outcome.as_str())
        .map_err(|err| eyre!("invalid expected outcome in scenario: {err}"))?;
    let actual = world.current_negotiation()?.outcome();
    if actual != expected {
        bail!("expected negotiation to be {expected}, found {actual}");
    }
    Ok(())
}

#[then(r#"slot "{name}" is "{status}""#)]
fn slot_is(world: &SwapWorld, name: String, status: String) -> eyre::Result<()> {
    let expected = SlotStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let actual = world.load_slot(&name)?.status();
    if actual != expected {
        bail!("expected slot {name} to be {expected}, found {actual}");
    }
    Ok(())
}

#[then(r#"slot "{name}" is owned by "{owner}""#)]
fn slot_is_owned_by(world: &SwapWorld, name: String, owner: String) -> eyre::Result<()> {
    let expected = world
        .users
        .get(&owner)
        .copied()
        .ok_or_else(|| eyre!("no user named {owner} in scenario world"))?;
    if world.load_slot(&name)?.owner_id() != expected {
        bail!("expected slot {name} to be owned by {owner}");
    }
    Ok(())
}

#[then(r#"the request fails with "{kind}""#)]
fn request_fails_with(world: &SwapWorld, kind: String) -> eyre::Result<()> {
    match world.last_error {
        Some(actual) if actual.as_str() == kind => Ok(()),
        Some(actual) => bail!("expected {kind} failure, got {actual}"),
        None => bail!("expected {kind} failure, but the request succeeded"),
    }
}

#[then("exactly one proposal succeeds")]
fn exactly_one_proposal_succeeds(world: &SwapWorld) -> eyre::Result<()> {
    let winners = world
        .attempts
        .iter()
        .filter(|(_, result)| result.is_ok())
        .count();
    if winners != 1 {
        bail!("expected one winning proposal, found {winners}");
    }
    Ok(())
}

#[then(r#"the losing proposal fails with "{kind}""#)]
fn losing_proposal_fails_with(world: &SwapWorld, kind: String) -> eyre::Result<()> {
    let unexpected = world
        .attempts
        .iter()
        .filter_map(|(_, result)| result.as_ref().err())
        .find(|actual| actual.as_str() != kind);
    if let Some(actual) = unexpected {
        bail!("expected losing proposal to fail with {kind}, got {actual}");
    }
    Ok(())
}

#[then(r#"the losing offer is "{status}""#)]
fn losing_offer_is(world: &SwapWorld, status: String) -> eyre::Result<()> {
    let expected = SlotStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid expected status in scenario: {err}"))?;
    let (loser, _) = world
        .attempts
        .iter()
        .find(|(_, result)| result.is_err())
        .ok_or_else(|| eyre!("no losing proposal recorded"))?;
    let name = world
        .slots
        .iter()
        .find_map(|(name, id)| (id == loser).then_some(name.as_str()))
        .ok_or_else(|| eyre!("losing offer is not a named slot"))?;
    let actual = world.load_slot(name)?.status();
    if actual != expected {
        bail!("expected losing offer {name} to be {expected}, found {actual}");
    }
    Ok(())
}
