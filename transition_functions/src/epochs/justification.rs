use std::collections::BTreeSet;

use helper_functions::beacon_state_accessors::{
    get_attesting_indices, get_block_root, get_current_epoch, get_previous_epoch,
    get_total_active_balance, get_total_balance,
};
use types::config::Config;
use types::consts::{has_flag, GENESIS_EPOCH, JUSTIFICATION_BITS_LENGTH, TIMELY_TARGET_FLAG_INDEX};
use types::primitives::{Epoch, Gwei, ValidatorIndex};
use types::types::Checkpoint;
use types::BeaconState;

use crate::error::Error;

/// Target-vote stake of the last two epochs, as counted by the fork-specific
/// participation representation.
pub struct JustificationStakes {
    pub previous_target: Gwei,
    pub current_target: Gwei,
    pub total_active: Gwei,
}

/// Tally from phase0 pending attestations.
pub fn phase0_justification_stakes<C: Config>(
    state: &BeaconState<C>,
) -> Result<JustificationStakes, Error> {
    let previous_epoch = get_previous_epoch(state);
    let current_epoch = get_current_epoch(state);

    Ok(JustificationStakes {
        previous_target: matching_target_stake(state, previous_epoch)?,
        current_target: matching_target_stake(state, current_epoch)?,
        total_active: get_total_active_balance(state)?,
    })
}

fn matching_target_stake<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
) -> Result<Gwei, Error> {
    let inner = state.as_phase0().ok_or(helper_functions::Error::WrongFork)?;
    let attestations = if epoch == get_current_epoch(state) {
        &inner.current_epoch_attestations
    } else {
        &inner.previous_epoch_attestations
    };

    let target_root = get_block_root(state, epoch)?;

    let mut attesting: BTreeSet<ValidatorIndex> = BTreeSet::new();
    for attestation in attestations.iter() {
        if attestation.data.target.root != target_root {
            continue;
        }
        attesting.extend(get_attesting_indices(
            state,
            &attestation.data,
            &attestation.aggregation_bits,
        )?);
    }

    let unslashed = attesting
        .into_iter()
        .filter(|index| !state.validators()[*index as usize].slashed);
    get_total_balance(state, unslashed).map_err(Error::from)
}

/// Tally from altair participation flags.
pub fn altair_justification_stakes<C: Config>(
    state: &BeaconState<C>,
) -> Result<JustificationStakes, Error> {
    Ok(JustificationStakes {
        previous_target: participating_target_stake(state, get_previous_epoch(state))?,
        current_target: participating_target_stake(state, get_current_epoch(state))?,
        total_active: get_total_active_balance(state)?,
    })
}

fn participating_target_stake<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
) -> Result<Gwei, Error> {
    let participation = if epoch == get_current_epoch(state) {
        state.current_epoch_participation()
    } else {
        state.previous_epoch_participation()
    }
    .ok_or(helper_functions::Error::WrongFork)?;

    let participating: Vec<ValidatorIndex> = state
        .validators()
        .iter()
        .zip(participation.iter())
        .enumerate()
        .filter(|(_, (validator, flags))| {
            !validator.slashed
                && validator.activation_epoch <= epoch
                && epoch < validator.exit_epoch
                && has_flag(**flags, TIMELY_TARGET_FLAG_INDEX)
        })
        .map(|(index, _)| index as u64)
        .collect();

    get_total_balance(state, participating).map_err(Error::from)
}

/// The four-rule justification and finalisation update over the rolling
/// 4-bit window.
pub fn process_justification_and_finalization<C: Config>(
    state: &mut BeaconState<C>,
    stakes: &JustificationStakes,
) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    if current_epoch <= GENESIS_EPOCH + 1 {
        return Ok(());
    }

    let previous_epoch = get_previous_epoch(state);
    let old_previous_justified = *state.previous_justified_checkpoint();
    let old_current_justified = *state.current_justified_checkpoint();

    let previous_target_root = get_block_root(state, previous_epoch)?;
    let current_target_root = get_block_root(state, current_epoch)?;

    // Rotate the window.
    *state.previous_justified_checkpoint_mut() = old_current_justified;
    let bits = state.justification_bits_mut();
    for i in (1..JUSTIFICATION_BITS_LENGTH).rev() {
        let lower = bits.get(i - 1).expect("window length is fixed");
        bits.set(i, lower).expect("window length is fixed");
    }
    bits.set(0, false).expect("window length is fixed");

    if stakes.previous_target * 3 >= stakes.total_active * 2 {
        *state.current_justified_checkpoint_mut() = Checkpoint {
            epoch: previous_epoch,
            root: previous_target_root,
        };
        state
            .justification_bits_mut()
            .set(1, true)
            .expect("window length is fixed");
    }
    if stakes.current_target * 3 >= stakes.total_active * 2 {
        *state.current_justified_checkpoint_mut() = Checkpoint {
            epoch: current_epoch,
            root: current_target_root,
        };
        state
            .justification_bits_mut()
            .set(0, true)
            .expect("window length is fixed");
    }

    let bits: Vec<bool> = state.justification_bits().iter().collect();
    let all = |range: core::ops::Range<usize>| range.clone().all(|i| bits[i]);

    // The 2nd/3rd/4th most recent epochs are justified, the 4th was the
    // source.
    if all(1..4) && old_previous_justified.epoch + 3 == current_epoch {
        *state.finalized_checkpoint_mut() = old_previous_justified;
    }
    // The 2nd/3rd most recent epochs are justified, the 3rd was the source.
    if all(1..3) && old_previous_justified.epoch + 2 == current_epoch {
        *state.finalized_checkpoint_mut() = old_previous_justified;
    }
    // The 1st/2nd/3rd most recent epochs are justified, the 3rd was the
    // source.
    if all(0..3) && old_current_justified.epoch + 2 == current_epoch {
        *state.finalized_checkpoint_mut() = old_current_justified;
    }
    // The 1st/2nd most recent epochs are justified, the 2nd was the source.
    if all(0..2) && old_current_justified.epoch + 1 == current_epoch {
        *state.finalized_checkpoint_mut() = old_current_justified;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H256;
    use ssz::FixedVector;
    use types::config::MinimalConfig;
    use types::phase0;

    fn state_at_slot(slot: u64) -> BeaconState<MinimalConfig> {
        let mut roots = vec![H256::zero(); 64];
        for (i, root) in roots.iter_mut().enumerate() {
            *root = H256::from_low_u64_be(i as u64 + 1);
        }
        BeaconState::Phase0(phase0::BeaconState {
            slot,
            block_roots: FixedVector::from(roots),
            ..phase0::BeaconState::default()
        })
    }

    fn supermajority(total: Gwei) -> Gwei {
        total * 2 / 3 + 1
    }

    #[test]
    fn nothing_happens_before_epoch_two() {
        let mut state = state_at_slot(7);
        let stakes = JustificationStakes {
            previous_target: 96,
            current_target: 96,
            total_active: 96,
        };
        process_justification_and_finalization(&mut state, &stakes).expect("Test");
        assert_eq!(state.current_justified_checkpoint().epoch, 0);
    }

    #[test]
    fn supermajority_justifies_the_current_epoch() {
        let mut state = state_at_slot(23);
        let stakes = JustificationStakes {
            previous_target: 0,
            current_target: supermajority(96),
            total_active: 96,
        };
        process_justification_and_finalization(&mut state, &stakes).expect("Test");
        assert_eq!(state.current_justified_checkpoint().epoch, 2);
        assert!(state.justification_bits().get(0).expect("Test"));
        assert_eq!(state.finalized_checkpoint().epoch, 0);
    }

    #[test]
    fn minority_justifies_nothing() {
        let mut state = state_at_slot(23);
        let stakes = JustificationStakes {
            previous_target: 32,
            current_target: 32,
            total_active: 96,
        };
        process_justification_and_finalization(&mut state, &stakes).expect("Test");
        assert_eq!(state.current_justified_checkpoint().epoch, 0);
        assert_eq!(state.finalized_checkpoint().epoch, 0);
    }

    #[test]
    fn consecutive_justification_finalizes() {
        let mut state = state_at_slot(23);
        let stakes = JustificationStakes {
            previous_target: supermajority(96),
            current_target: supermajority(96),
            total_active: 96,
        };

        // Epoch 2: both targets justified.
        process_justification_and_finalization(&mut state, &stakes).expect("Test");
        assert_eq!(state.current_justified_checkpoint().epoch, 2);

        // Epoch 3: the old current-justified checkpoint (epoch 2) becomes
        // finalised by the 1st/2nd-most-recent rule.
        *state.slot_mut() = 31;
        process_justification_and_finalization(&mut state, &stakes).expect("Test");
        assert_eq!(state.current_justified_checkpoint().epoch, 3);
        assert_eq!(state.finalized_checkpoint().epoch, 2);
    }
}
