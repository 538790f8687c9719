use core::mem;

use ethereum_types::H256;
use log::info;
use typenum::Unsigned;

use helper_functions::beacon_state_accessors::get_current_epoch;
use helper_functions::crypto::hash_tree_root;
use types::cancel::Cancellation;
use types::config::{Config, ForkName, ForkSchedule};
use types::{phase0, BeaconState, SignedBeaconBlock};

use crate::blocks::process_block;
use crate::epochs::process_epoch;
use crate::error::Error;
use crate::execution_engine::ExecutionEngine;
use crate::upgrades::{upgrade_to_altair, upgrade_to_merge};

/// The full transition: advance to the block's slot, apply the block, check
/// the claimed post-state root. Runs on a working copy; any error leaves the
/// caller's canonical state untouched.
pub fn state_transition<C: Config>(
    state: &mut BeaconState<C>,
    signed_block: &SignedBeaconBlock<C>,
    schedule: &ForkSchedule,
    engine: &dyn ExecutionEngine<C>,
    verify_signatures: bool,
    validate_result: bool,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    process_slots(state, signed_block.slot(), schedule, cancellation)?;
    process_block(state, signed_block, engine, verify_signatures, cancellation)?;

    if validate_result && signed_block.state_root() != state.tree_hash_root() {
        return Err(Error::StateRootMismatch);
    }
    Ok(())
}

/// Advances the state through empty slots up to `target_slot`, running epoch
/// processing at boundaries and applying scheduled fork upgrades when their
/// epoch is reached.
pub fn process_slots<C: Config>(
    state: &mut BeaconState<C>,
    target_slot: u64,
    schedule: &ForkSchedule,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    if state.slot() > target_slot {
        return Err(Error::SlotRegression {
            state_slot: state.slot(),
            target: target_slot,
        });
    }

    while state.slot() < target_slot {
        cancellation.checkpoint()?;
        process_slot(state);

        // Epoch processing runs on the last slot of an epoch, before the
        // slot increment.
        if (state.slot() + 1) % C::SlotsPerEpoch::to_u64() == 0 {
            process_epoch(state, cancellation)?;
        }
        *state.slot_mut() += 1;

        if state.slot() % C::SlotsPerEpoch::to_u64() == 0 {
            apply_scheduled_upgrades(state, schedule)?;
        }
    }
    Ok(())
}

fn process_slot<C: Config>(state: &mut BeaconState<C>) {
    let previous_state_root = state.tree_hash_root();
    let index = (state.slot() % C::SlotsPerHistoricalRoot::to_u64()) as usize;
    state.state_roots_mut()[index] = previous_state_root;

    // Closing the header: its post-state root becomes known one slot later.
    if state.latest_block_header().state_root == H256::zero() {
        state.latest_block_header_mut().state_root = previous_state_root;
    }

    let previous_block_root = hash_tree_root(state.latest_block_header());
    state.block_roots_mut()[index] = previous_block_root;
}

fn apply_scheduled_upgrades<C: Config>(
    state: &mut BeaconState<C>,
    schedule: &ForkSchedule,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);

    if epoch == schedule.altair_fork_epoch && state.fork_name() == ForkName::Phase0 {
        info!("upgrading the state to altair at epoch {}", epoch);
        let owned = mem::replace(state, BeaconState::Phase0(phase0::BeaconState::default()));
        let pre = match owned {
            BeaconState::Phase0(pre) => pre,
            _ => unreachable!("fork name was checked above"),
        };
        *state = BeaconState::Altair(upgrade_to_altair(pre)?);
    }

    if epoch == schedule.merge_fork_epoch && state.fork_name() == ForkName::Altair {
        info!("upgrading the state to merge at epoch {}", epoch);
        let owned = mem::replace(state, BeaconState::Phase0(phase0::BeaconState::default()));
        let pre = match owned {
            BeaconState::Altair(pre) => pre,
            _ => unreachable!("fork name was checked above"),
        };
        *state = BeaconState::Merge(upgrade_to_merge(pre));
    }

    Ok(())
}
