use std::convert::TryFrom;

use typenum::Unsigned;

use types::config::{Config, ForkName};
use types::consts::{PROPOSER_WEIGHT, WEIGHT_DENOMINATOR};
use types::primitives::{Epoch, Gwei, ValidatorIndex};
use types::BeaconState;

use crate::beacon_state_accessors::{
    get_beacon_proposer_index, get_current_epoch, get_validator_churn_limit,
};
use crate::error::Error;
use crate::misc::compute_activation_exit_epoch;

pub fn increase_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let index = usize::try_from(index).map_err(|_| Error::IndexOutOfRange)?;
    let balance = state
        .balances_mut()
        .get_mut(index)
        .ok_or(Error::IndexOutOfRange)?;
    *balance = balance.saturating_add(delta);
    Ok(())
}

pub fn decrease_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let index = usize::try_from(index).map_err(|_| Error::IndexOutOfRange)?;
    let balance = state
        .balances_mut()
        .get_mut(index)
        .ok_or(Error::IndexOutOfRange)?;
    *balance = balance.saturating_sub(delta);
    Ok(())
}

/// Queues the validator for exit at the earliest epoch the churn limit
/// admits. Once set, the exit epoch is never changed again.
pub fn initiate_validator_exit<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
) -> Result<(), Error> {
    let id = usize::try_from(index).map_err(|_| Error::IndexOutOfRange)?;
    if id >= state.validators().len() {
        return Err(Error::IndexOutOfRange);
    }

    if state.validators()[id].exit_epoch != C::far_future_epoch() {
        return Err(Error::ValidatorExitAlreadyInitiated);
    }

    let max_exit_epoch = state
        .validators()
        .iter()
        .map(|validator| validator.exit_epoch)
        .filter(|exit_epoch| *exit_epoch != C::far_future_epoch())
        .max()
        .unwrap_or(0);

    let mut exit_queue_epoch: Epoch =
        max_exit_epoch.max(compute_activation_exit_epoch::<C>(get_current_epoch(state)));

    let exit_queue_churn = state
        .validators()
        .iter()
        .filter(|validator| validator.exit_epoch == exit_queue_epoch)
        .count() as u64;
    if exit_queue_churn >= get_validator_churn_limit(state) {
        exit_queue_epoch += 1;
    }

    let withdrawable_epoch = exit_queue_epoch + C::min_validator_withdrawability_delay();
    let validator = &mut state.validators_mut()[id];
    validator.exit_epoch = exit_queue_epoch;
    validator.withdrawable_epoch = withdrawable_epoch;

    Ok(())
}

/// Penalises the validator, records the slashed stake in the slashings ring,
/// and pays out the whistleblower split. The slashing quotients changed in
/// altair, so the penalty depends on the state's fork.
pub fn slash_validator<C: Config>(
    state: &mut BeaconState<C>,
    slashed_index: ValidatorIndex,
    whistleblower_index: Option<ValidatorIndex>,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);
    initiate_validator_exit(state, slashed_index)?;

    let id = usize::try_from(slashed_index).map_err(|_| Error::IndexOutOfRange)?;
    let effective_balance = {
        let validator = &mut state.validators_mut()[id];
        validator.slashed = true;
        validator.withdrawable_epoch = validator
            .withdrawable_epoch
            .max(epoch + C::EpochsPerSlashingsVector::to_u64());
        validator.effective_balance
    };

    let slashings_index =
        usize::try_from(epoch % C::EpochsPerSlashingsVector::to_u64())
            .map_err(|_| Error::IndexOutOfRange)?;
    state.slashings_mut()[slashings_index] += effective_balance;

    let min_slashing_penalty_quotient = match state.fork_name() {
        ForkName::Phase0 => C::min_slashing_penalty_quotient(),
        ForkName::Altair | ForkName::Merge => C::min_slashing_penalty_quotient_altair(),
    };
    decrease_balance(
        state,
        slashed_index,
        effective_balance / min_slashing_penalty_quotient,
    )?;

    let proposer_index = get_beacon_proposer_index(state)?;
    let whistleblower = whistleblower_index.unwrap_or(proposer_index);
    let whistleblower_reward = effective_balance / C::whistleblower_reward_quotient();
    let proposer_reward = match state.fork_name() {
        ForkName::Phase0 => whistleblower_reward / C::proposer_reward_quotient(),
        ForkName::Altair | ForkName::Merge => {
            whistleblower_reward * PROPOSER_WEIGHT / WEIGHT_DENOMINATOR
        }
    };
    increase_balance(state, proposer_index, proposer_reward)?;
    increase_balance(state, whistleblower, whistleblower_reward - proposer_reward)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::VariableList;
    use types::config::MinimalConfig;
    use types::phase0;
    use types::types::Validator;

    fn active_validator() -> Validator {
        Validator {
            effective_balance: 32_000_000_000,
            activation_epoch: 0,
            exit_epoch: u64::max_value(),
            withdrawable_epoch: u64::max_value(),
            ..Validator::default()
        }
    }

    fn state_of(validators: Vec<Validator>) -> BeaconState<MinimalConfig> {
        let balances: Vec<u64> = validators.iter().map(|v| v.effective_balance).collect();
        BeaconState::Phase0(phase0::BeaconState {
            validators: VariableList::from(validators),
            balances: VariableList::from(balances),
            ..phase0::BeaconState::default()
        })
    }

    #[test]
    fn test_increase_balance() {
        let mut state = state_of(vec![active_validator()]);
        increase_balance(&mut state, 0, 1).expect("Test");
        assert_eq!(state.balances()[0], 32_000_000_001);
    }

    #[test]
    fn test_decrease_balance_saturates() {
        let mut state = state_of(vec![active_validator()]);
        decrease_balance(&mut state, 0, u64::max_value()).expect("Test");
        assert_eq!(state.balances()[0], 0);
    }

    #[test]
    fn test_balance_index_out_of_range() {
        let mut state = state_of(vec![]);
        assert_eq!(
            increase_balance(&mut state, 0, 1),
            Err(Error::IndexOutOfRange)
        );
    }

    #[test]
    fn test_initiate_validator_exit() {
        let mut state = state_of(vec![active_validator(), active_validator()]);
        initiate_validator_exit(&mut state, 1).expect("Test");

        let exit_epoch = state.validators()[1].exit_epoch;
        assert_eq!(exit_epoch, compute_activation_exit_epoch::<MinimalConfig>(0));
        assert_eq!(
            state.validators()[1].withdrawable_epoch,
            exit_epoch + MinimalConfig::min_validator_withdrawability_delay()
        );
    }

    #[test]
    fn test_initiate_validator_exit_twice() {
        let mut state = state_of(vec![active_validator()]);
        initiate_validator_exit(&mut state, 0).expect("Test");
        assert_eq!(
            initiate_validator_exit(&mut state, 0),
            Err(Error::ValidatorExitAlreadyInitiated)
        );
    }

    #[test]
    fn test_slash_validator() {
        let mut state = state_of(vec![active_validator(), active_validator()]);
        // Slash whichever validator is not proposing, so the whistleblower
        // reward does not flow back to the slashed balance.
        let proposer = get_beacon_proposer_index(&state).expect("Test");
        let victim = 1 - proposer;
        let balance_before = state.balances()[victim as usize];

        slash_validator(&mut state, victim, None).expect("Test");

        let slashed = &state.validators()[victim as usize];
        assert!(slashed.slashed);
        assert!(slashed.withdrawable_epoch > get_current_epoch(&state));
        assert!(
            state.balances()[victim as usize]
                <= balance_before
                    - slashed.effective_balance
                        / MinimalConfig::min_slashing_penalty_quotient()
        );
        assert_eq!(state.slashings().iter().sum::<u64>(), 32_000_000_000);
    }
}
