use core::mem;

use itertools::Itertools;
use ssz::VariableList;
use typenum::Unsigned;

use helper_functions::beacon_state_accessors::{
    get_current_epoch, get_randao_mix, get_total_active_balance, get_validator_churn_limit,
};
use helper_functions::beacon_state_mutators::{decrease_balance, initiate_validator_exit};
use helper_functions::crypto::hash_tree_root;
use helper_functions::misc::compute_activation_exit_epoch;
use helper_functions::predicates::{
    is_active_validator, is_eligible_for_activation, is_eligible_for_activation_queue,
};
use types::cancel::Cancellation;
use types::config::{Config, ForkName};
use types::primitives::Gwei;
use types::types::HistoricalBatch;
use types::BeaconState;

use crate::epochs::justification::{
    altair_justification_stakes, phase0_justification_stakes,
    process_justification_and_finalization,
};
use crate::epochs::rewards::{
    process_inactivity_updates, process_rewards_and_penalties_altair,
    process_rewards_and_penalties_phase0,
};
use crate::epochs::sync_committees::process_sync_committee_updates;
use crate::error::Error;

/// Epoch-boundary processing in the order fixed by the protocol. The merge
/// fork carries altair's attestation and reward semantics unchanged.
pub fn process_epoch<C: Config>(
    state: &mut BeaconState<C>,
    cancellation: &Cancellation,
) -> Result<(), Error> {
    cancellation.checkpoint()?;
    match state.fork_name() {
        ForkName::Phase0 => {
            let stakes = phase0_justification_stakes(state)?;
            process_justification_and_finalization(state, &stakes)?;
            cancellation.checkpoint()?;
            process_rewards_and_penalties_phase0(state)?;
        }
        ForkName::Altair | ForkName::Merge => {
            let stakes = altair_justification_stakes(state)?;
            process_justification_and_finalization(state, &stakes)?;
            cancellation.checkpoint()?;
            process_inactivity_updates(state)?;
            cancellation.checkpoint()?;
            process_rewards_and_penalties_altair(state)?;
        }
    }

    cancellation.checkpoint()?;
    process_registry_updates(state)?;
    cancellation.checkpoint()?;
    process_slashings(state)?;
    cancellation.checkpoint()?;
    process_effective_balance_updates(state);
    process_eth1_data_reset(state);
    process_slashings_reset(state);
    process_randao_mixes_reset(state)?;
    process_historical_roots_update(state)?;
    process_participation_rollover(state);

    if state.fork_name() != ForkName::Phase0 {
        cancellation.checkpoint()?;
        process_sync_committee_updates(state)?;
    }

    Ok(())
}

/// Activations in deterministic order (eligibility epoch, then index),
/// bounded by churn; ejections of underfunded validators.
pub fn process_registry_updates<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);

    let mut newly_eligible = vec![];
    let mut ejected = vec![];
    for (index, validator) in state.validators().iter().enumerate() {
        if is_eligible_for_activation_queue::<C>(validator) {
            newly_eligible.push(index);
        }
        if is_active_validator(validator, current_epoch)
            && validator.effective_balance <= C::ejection_balance()
        {
            ejected.push(index as u64);
        }
    }

    for index in newly_eligible {
        state.validators_mut()[index].activation_eligibility_epoch = current_epoch + 1;
    }
    for index in ejected {
        match initiate_validator_exit(state, index) {
            Ok(()) | Err(helper_functions::Error::ValidatorExitAlreadyInitiated) => {}
            Err(error) => return Err(error.into()),
        }
    }

    let activation_queue = state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| is_eligible_for_activation(state, validator))
        .sorted_by_key(|(index, validator)| (validator.activation_eligibility_epoch, *index))
        .map(|(index, _)| index)
        .collect_vec();

    let churn_limit = get_validator_churn_limit(state) as usize;
    let activation_epoch = compute_activation_exit_epoch::<C>(current_epoch);
    for index in activation_queue.into_iter().take(churn_limit) {
        state.validators_mut()[index].activation_epoch = activation_epoch;
    }

    Ok(())
}

/// Correlated slashing penalties at the half-way point of each slashed
/// validator's withdrawability delay.
pub fn process_slashings<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let epoch = get_current_epoch(state);
    let total_balance = get_total_active_balance(state)?;
    let increment = C::effective_balance_increment();

    let multiplier = match state.fork_name() {
        ForkName::Phase0 => C::proportional_slashing_multiplier(),
        ForkName::Altair | ForkName::Merge => C::proportional_slashing_multiplier_altair(),
    };
    let slashings_sum: Gwei = state.slashings().iter().sum();
    let adjusted_total = (slashings_sum * multiplier).min(total_balance);

    let half_vector = C::EpochsPerSlashingsVector::to_u64() / 2;
    let penalised: Vec<(u64, Gwei)> = state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.slashed && epoch + half_vector == validator.withdrawable_epoch
        })
        .map(|(index, validator)| {
            let penalty_numerator =
                validator.effective_balance / increment * adjusted_total;
            (index as u64, penalty_numerator / total_balance * increment)
        })
        .collect();

    for (index, penalty) in penalised {
        decrease_balance(state, index, penalty)?;
    }

    Ok(())
}

/// Requantises effective balances toward actual balances with hysteresis.
pub fn process_effective_balance_updates<C: Config>(state: &mut BeaconState<C>) {
    let increment = C::effective_balance_increment();
    let hysteresis_increment = increment / C::hysteresis_quotient();
    let downward_threshold = hysteresis_increment * C::hysteresis_downward_multiplier();
    let upward_threshold = hysteresis_increment * C::hysteresis_upward_multiplier();

    let balances: Vec<Gwei> = state.balances().to_vec();
    for (index, validator) in state.validators_mut().iter_mut().enumerate() {
        let balance = balances[index];
        if balance + downward_threshold < validator.effective_balance
            || validator.effective_balance + upward_threshold < balance
        {
            validator.effective_balance =
                (balance - balance % increment).min(C::max_effective_balance());
        }
    }
}

pub fn process_eth1_data_reset<C: Config>(state: &mut BeaconState<C>) {
    let next_epoch = get_current_epoch(state) + 1;
    if next_epoch % C::epochs_per_eth1_voting_period() == 0 {
        *state.eth1_data_votes_mut() = VariableList::empty();
    }
}

pub fn process_slashings_reset<C: Config>(state: &mut BeaconState<C>) {
    let next_epoch = get_current_epoch(state) + 1;
    let index = (next_epoch % C::EpochsPerSlashingsVector::to_u64()) as usize;
    state.slashings_mut()[index] = 0;
}

pub fn process_randao_mixes_reset<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    let current_epoch = get_current_epoch(state);
    let next_epoch = current_epoch + 1;
    let mix = get_randao_mix(state, current_epoch)?;
    let index = (next_epoch % C::EpochsPerHistoricalVector::to_u64()) as usize;
    state.randao_mixes_mut()[index] = mix;
    Ok(())
}

pub fn process_historical_roots_update<C: Config>(
    state: &mut BeaconState<C>,
) -> Result<(), Error> {
    let next_epoch = get_current_epoch(state) + 1;
    let epochs_per_period =
        C::SlotsPerHistoricalRoot::to_u64() / C::SlotsPerEpoch::to_u64();
    if next_epoch % epochs_per_period == 0 {
        let batch = HistoricalBatch::<C> {
            block_roots: state.block_roots().clone(),
            state_roots: state.state_roots().clone(),
        };
        state
            .historical_roots_mut()
            .push(hash_tree_root(&batch))
            .map_err(|_| helper_functions::Error::IndexOutOfRange)?;
    }
    Ok(())
}

/// Phase0 swaps the pending-attestation windows; altair rotates the
/// participation bitfields.
pub fn process_participation_rollover<C: Config>(state: &mut BeaconState<C>) {
    match state {
        BeaconState::Phase0(inner) => {
            inner.previous_epoch_attestations = mem::replace(
                &mut inner.current_epoch_attestations,
                VariableList::empty(),
            );
        }
        BeaconState::Altair(inner) => {
            let zeroed = VariableList::from(vec![0; inner.validators.len()]);
            inner.previous_epoch_participation =
                mem::replace(&mut inner.current_epoch_participation, zeroed);
        }
        BeaconState::Merge(inner) => {
            let zeroed = VariableList::from(vec![0; inner.validators.len()]);
            inner.previous_epoch_participation =
                mem::replace(&mut inner.current_epoch_participation, zeroed);
        }
    }
}
