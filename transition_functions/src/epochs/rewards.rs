use std::collections::BTreeSet;

use integer_sqrt::IntegerSquareRoot;

use helper_functions::beacon_state_accessors::{
    get_attesting_indices, get_block_root, get_block_root_at_slot, get_current_epoch,
    get_previous_epoch, get_total_active_balance, get_total_balance,
};
use helper_functions::beacon_state_mutators::{decrease_balance, increase_balance};
use types::config::Config;
use types::consts::{
    has_flag, GENESIS_EPOCH, BASE_REWARDS_PER_EPOCH, PARTICIPATION_FLAG_WEIGHTS,
    TIMELY_HEAD_FLAG_INDEX, TIMELY_TARGET_FLAG_INDEX, WEIGHT_DENOMINATOR,
};
use types::primitives::{Epoch, Gwei, ValidatorIndex};
use types::BeaconState;

use crate::error::Error;

/// Validators that participate in this epoch's reward accounting: active in
/// the previous epoch, or slashed but not yet withdrawable.
pub fn eligible_validator_indices<C: Config>(state: &BeaconState<C>) -> Vec<ValidatorIndex> {
    let previous_epoch = get_previous_epoch(state);

    state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            let active = validator.activation_epoch <= previous_epoch
                && previous_epoch < validator.exit_epoch;
            active || (validator.slashed && previous_epoch + 1 < validator.withdrawable_epoch)
        })
        .map(|(index, _)| index as u64)
        .collect()
}

pub fn finality_delay<C: Config>(state: &BeaconState<C>) -> Epoch {
    get_previous_epoch(state) - state.finalized_checkpoint().epoch
}

pub fn is_in_inactivity_leak<C: Config>(state: &BeaconState<C>) -> bool {
    finality_delay(state) > C::min_epochs_to_inactivity_penalty()
}

fn phase0_base_reward<C: Config>(
    state: &BeaconState<C>,
    index: ValidatorIndex,
    total_balance_sqrt: u64,
) -> Gwei {
    let effective_balance = state.validators()[index as usize].effective_balance;
    effective_balance * C::base_reward_factor() / total_balance_sqrt / BASE_REWARDS_PER_EPOCH
}

fn altair_base_reward<C: Config>(
    state: &BeaconState<C>,
    index: ValidatorIndex,
    total_balance_sqrt: u64,
) -> Gwei {
    let increments =
        state.validators()[index as usize].effective_balance / C::effective_balance_increment();
    increments * (C::effective_balance_increment() * C::base_reward_factor() / total_balance_sqrt)
}

#[derive(Clone, Copy, Default)]
struct Delta {
    reward: Gwei,
    penalty: Gwei,
}

fn apply_deltas<C: Config>(
    state: &mut BeaconState<C>,
    deltas: &[Delta],
) -> Result<(), Error> {
    for (index, delta) in deltas.iter().enumerate() {
        increase_balance(state, index as u64, delta.reward)?;
        decrease_balance(state, index as u64, delta.penalty)?;
    }
    Ok(())
}

pub fn process_rewards_and_penalties_phase0<C: Config>(
    state: &mut BeaconState<C>,
) -> Result<(), Error> {
    if get_current_epoch(state) == GENESIS_EPOCH {
        return Ok(());
    }

    let deltas = phase0_attestation_deltas(state)?;
    apply_deltas(state, &deltas)
}

/// Source/target/head component deltas, inclusion-delay rewards, and the
/// inactivity-leak penalty, from the previous epoch's pending attestations.
fn phase0_attestation_deltas<C: Config>(state: &BeaconState<C>) -> Result<Vec<Delta>, Error> {
    let previous_epoch = get_previous_epoch(state);
    let total_balance = get_total_active_balance(state)?;
    let total_balance_sqrt = total_balance.integer_sqrt();
    let increment = C::effective_balance_increment();

    let inner = state.as_phase0().ok_or(helper_functions::Error::WrongFork)?;
    let previous_target_root = get_block_root(state, previous_epoch)?;

    // The source component matched at inclusion time, so every stored
    // previous-epoch attestation counts for it.
    let matching_source: Vec<_> = inner.previous_epoch_attestations.iter().collect();
    let matching_target: Vec<_> = matching_source
        .iter()
        .copied()
        .filter(|attestation| attestation.data.target.root == previous_target_root)
        .collect();
    let matching_head: Vec<_> = matching_target
        .iter()
        .copied()
        .filter(|attestation| {
            get_block_root_at_slot(state, attestation.data.slot)
                .map(|root| root == attestation.data.beacon_block_root)
                .unwrap_or(false)
        })
        .collect();

    let unslashed = |attestations: &[&types::types::PendingAttestation<C>]| {
        let mut indices: BTreeSet<ValidatorIndex> = BTreeSet::new();
        for attestation in attestations {
            indices.extend(
                get_attesting_indices(state, &attestation.data, &attestation.aggregation_bits)
                    .unwrap_or_default(),
            );
        }
        indices.retain(|index| !state.validators()[*index as usize].slashed);
        indices
    };

    let source_indices = unslashed(&matching_source);
    let target_indices = unslashed(&matching_target);
    let head_indices = unslashed(&matching_head);

    let source_balance = get_total_balance(state, source_indices.iter().copied())?;
    let target_balance = get_total_balance(state, target_indices.iter().copied())?;
    let head_balance = get_total_balance(state, head_indices.iter().copied())?;

    let mut deltas = vec![Delta::default(); state.validators().len()];
    let leaking = is_in_inactivity_leak::<C>(state);

    for index in eligible_validator_indices(state) {
        let base_reward = phase0_base_reward::<C>(state, index, total_balance_sqrt);
        let proposer_reward = base_reward / C::proposer_reward_quotient();
        let delta = &mut deltas[index as usize];

        for (indices, attesting_balance) in [
            (&source_indices, source_balance),
            (&target_indices, target_balance),
            (&head_indices, head_balance),
        ]
        .iter()
        {
            if indices.contains(&index) {
                if leaking {
                    // The participation component is fully refunded during a
                    // leak; only the inactivity penalty below bites.
                    delta.reward += base_reward;
                } else {
                    delta.reward += base_reward * (attesting_balance / increment)
                        / (total_balance / increment);
                }
            } else {
                delta.penalty += base_reward;
            }
        }

        if leaking {
            delta.penalty += BASE_REWARDS_PER_EPOCH * base_reward - proposer_reward;
            if !target_indices.contains(&index) {
                delta.penalty += state.validators()[index as usize].effective_balance
                    * finality_delay(state)
                    / C::inactivity_penalty_quotient();
            }
        }
    }

    // Inclusion-delay rewards go to the earliest inclusion of each source
    // attester, split between the attester and the including proposer.
    for index in &source_indices {
        let earliest = matching_source
            .iter()
            .filter(|attestation| {
                get_attesting_indices(state, &attestation.data, &attestation.aggregation_bits)
                    .map(|indices| indices.contains(index))
                    .unwrap_or(false)
            })
            .min_by_key(|attestation| attestation.inclusion_delay);

        if let Some(attestation) = earliest {
            let base_reward = phase0_base_reward::<C>(state, *index, total_balance_sqrt);
            let proposer_reward = base_reward / C::proposer_reward_quotient();
            deltas[attestation.proposer_index as usize].reward += proposer_reward;
            deltas[*index as usize].reward +=
                (base_reward - proposer_reward) / attestation.inclusion_delay;
        }
    }

    Ok(deltas)
}

/// Unslashed validators active at `epoch` whose participation carries the
/// given flag.
pub fn unslashed_participating_indices<C: Config>(
    state: &BeaconState<C>,
    flag_index: usize,
    epoch: Epoch,
) -> Result<BTreeSet<ValidatorIndex>, Error> {
    let participation = if epoch == get_current_epoch(state) {
        state.current_epoch_participation()
    } else {
        state.previous_epoch_participation()
    }
    .ok_or(helper_functions::Error::WrongFork)?;

    Ok(state
        .validators()
        .iter()
        .zip(participation.iter())
        .enumerate()
        .filter(|(_, (validator, flags))| {
            !validator.slashed
                && validator.activation_epoch <= epoch
                && epoch < validator.exit_epoch
                && has_flag(**flags, flag_index)
        })
        .map(|(index, _)| index as u64)
        .collect())
}

pub fn process_rewards_and_penalties_altair<C: Config>(
    state: &mut BeaconState<C>,
) -> Result<(), Error> {
    if get_current_epoch(state) == GENESIS_EPOCH {
        return Ok(());
    }

    let previous_epoch = get_previous_epoch(state);
    let total_balance = get_total_active_balance(state)?;
    let total_balance_sqrt = total_balance.integer_sqrt();
    let increment = C::effective_balance_increment();
    let active_increments = total_balance / increment;
    let leaking = is_in_inactivity_leak::<C>(state);

    let eligible = eligible_validator_indices(state);
    let mut deltas = vec![Delta::default(); state.validators().len()];

    for (flag_index, weight) in PARTICIPATION_FLAG_WEIGHTS.iter() {
        let participating =
            unslashed_participating_indices(state, *flag_index, previous_epoch)?;
        let participating_balance =
            get_total_balance(state, participating.iter().copied())?;
        let participating_increments = participating_balance / increment;

        for index in &eligible {
            let base_reward = altair_base_reward::<C>(state, *index, total_balance_sqrt);
            let delta = &mut deltas[*index as usize];

            if participating.contains(index) {
                if !leaking {
                    let numerator = base_reward * weight * participating_increments;
                    delta.reward += numerator / (active_increments * WEIGHT_DENOMINATOR);
                }
            } else if *flag_index != TIMELY_HEAD_FLAG_INDEX {
                delta.penalty += base_reward * weight / WEIGHT_DENOMINATOR;
            }
        }
    }

    // Inactivity penalties scale with the accumulated score rather than with
    // the finality delay.
    let target_participants =
        unslashed_participating_indices(state, TIMELY_TARGET_FLAG_INDEX, previous_epoch)?;
    let scores = state
        .inactivity_scores()
        .ok_or(helper_functions::Error::WrongFork)?;
    for index in &eligible {
        if !target_participants.contains(index) {
            let penalty_numerator = state.validators()[*index as usize].effective_balance
                * scores[*index as usize];
            let penalty_denominator =
                C::inactivity_score_bias() * C::inactivity_penalty_quotient_altair();
            deltas[*index as usize].penalty += penalty_numerator / penalty_denominator;
        }
    }

    apply_deltas(state, &deltas)
}

/// Altair inactivity-score bookkeeping, run before rewards.
pub fn process_inactivity_updates<C: Config>(state: &mut BeaconState<C>) -> Result<(), Error> {
    if get_current_epoch(state) == GENESIS_EPOCH {
        return Ok(());
    }

    let previous_epoch = get_previous_epoch(state);
    let target_participants =
        unslashed_participating_indices(state, TIMELY_TARGET_FLAG_INDEX, previous_epoch)?;
    let leaking = is_in_inactivity_leak::<C>(state);
    let eligible = eligible_validator_indices(state);

    let scores = state
        .inactivity_scores_mut()
        .ok_or(helper_functions::Error::WrongFork)?;

    for index in eligible {
        let score = &mut scores[index as usize];
        if target_participants.contains(&index) {
            *score -= (*score).min(1);
        } else {
            *score += C::inactivity_score_bias();
        }
        if !leaking {
            *score -= (*score).min(C::inactivity_score_recovery_rate());
        }
    }

    Ok(())
}
