use std::collections::BTreeSet;
use std::convert::TryFrom;

use ethereum_types::H256;
use ssz::BitList;
use typenum::Unsigned;

use types::config::Config;
use types::primitives::*;
use types::types::{Attestation, AttestationData, IndexedAttestation};
use types::BeaconState;

use crate::crypto::hash;
use crate::error::Error;
use crate::math::int_to_bytes;
use crate::misc::{
    compute_committee, compute_domain, compute_epoch_at_slot, compute_proposer_index,
};
use crate::predicates::is_active_validator;

pub fn get_current_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    compute_epoch_at_slot::<C>(state.slot())
}

pub fn get_previous_epoch<C: Config>(state: &BeaconState<C>) -> Epoch {
    let current_epoch = get_current_epoch(state);
    let genesis_epoch = C::genesis_epoch();

    if current_epoch > genesis_epoch {
        current_epoch - 1
    } else {
        genesis_epoch
    }
}

pub fn get_block_root<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    get_block_root_at_slot(state, epoch * C::SlotsPerEpoch::to_u64())
}

pub fn get_block_root_at_slot<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
) -> Result<H256, Error> {
    if !(slot < state.slot() && state.slot() <= slot + C::SlotsPerHistoricalRoot::to_u64()) {
        return Err(Error::RootOutOfRange);
    }

    let index = usize::try_from(slot % C::SlotsPerHistoricalRoot::to_u64())
        .map_err(|_| Error::IndexOutOfRange)?;
    Ok(state.block_roots()[index])
}

pub fn get_state_root_at_slot<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
) -> Result<H256, Error> {
    if !(slot < state.slot() && state.slot() <= slot + C::SlotsPerHistoricalRoot::to_u64()) {
        return Err(Error::RootOutOfRange);
    }

    let index = usize::try_from(slot % C::SlotsPerHistoricalRoot::to_u64())
        .map_err(|_| Error::IndexOutOfRange)?;
    Ok(state.state_roots()[index])
}

pub fn get_randao_mix<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<H256, Error> {
    let index = usize::try_from(epoch % C::EpochsPerHistoricalVector::to_u64())
        .map_err(|_| Error::IndexOutOfRange)?;
    Ok(state.randao_mixes()[index])
}

pub fn get_active_validator_indices<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
) -> Vec<ValidatorIndex> {
    state
        .validators()
        .iter()
        .enumerate()
        .filter(|(_, validator)| is_active_validator(validator, epoch))
        .map(|(index, _)| index as u64)
        .collect()
}

pub fn get_validator_churn_limit<C: Config>(state: &BeaconState<C>) -> u64 {
    let active = get_active_validator_indices(state, get_current_epoch(state));
    C::min_per_epoch_churn_limit().max(active.len() as u64 / C::churn_limit_quotient())
}

pub fn get_seed<C: Config>(
    state: &BeaconState<C>,
    epoch: Epoch,
    domain_type: DomainType,
) -> Result<H256, Error> {
    let lookahead_epoch =
        epoch + C::EpochsPerHistoricalVector::to_u64() - C::min_seed_lookahead() - 1;
    let mix = get_randao_mix(state, lookahead_epoch)?;

    let mut preimage = domain_type.to_vec();
    preimage.append(&mut int_to_bytes(epoch, 8));
    preimage.extend_from_slice(mix.as_bytes());

    Ok(H256::from_slice(&hash(&preimage)))
}

pub fn get_committee_count_per_slot<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> u64 {
    let active = get_active_validator_indices(state, epoch).len() as u64;
    (active / C::SlotsPerEpoch::to_u64() / C::target_committee_size())
        .min(C::max_committees_per_slot())
        .max(1)
}

pub fn get_beacon_committee<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
    index: CommitteeIndex,
) -> Result<Vec<ValidatorIndex>, Error> {
    let epoch = compute_epoch_at_slot::<C>(slot);
    let committees_per_slot = get_committee_count_per_slot(state, epoch);
    if index >= committees_per_slot {
        return Err(Error::CommitteeIndexOutOfRange);
    }

    let indices = get_active_validator_indices(state, epoch);
    let seed = get_seed(state, epoch, C::domain_beacon_attester())?;

    compute_committee::<C>(
        &indices,
        seed,
        (slot % C::SlotsPerEpoch::to_u64()) * committees_per_slot + index,
        committees_per_slot * C::SlotsPerEpoch::to_u64(),
    )
}

pub fn get_beacon_proposer_index<C: Config>(
    state: &BeaconState<C>,
) -> Result<ValidatorIndex, Error> {
    let epoch = get_current_epoch(state);

    let mut preimage = get_seed(state, epoch, C::domain_beacon_proposer())?
        .as_bytes()
        .to_vec();
    preimage.append(&mut int_to_bytes(state.slot(), 8));
    let seed = H256::from_slice(&hash(&preimage));

    let indices = get_active_validator_indices(state, epoch);
    compute_proposer_index::<C>(
        |index| state.validators()[index as usize].effective_balance,
        &indices,
        seed,
    )
}

/// Sum of effective balances, floored at one increment so that quotients by
/// total balance never divide by zero.
pub fn get_total_balance<C: Config>(
    state: &BeaconState<C>,
    indices: impl IntoIterator<Item = ValidatorIndex>,
) -> Result<Gwei, Error> {
    let mut sum = 0_u64;
    for index in indices {
        let index = usize::try_from(index).map_err(|_| Error::IndexOutOfRange)?;
        let validator = state.validators().get(index).ok_or(Error::IndexOutOfRange)?;
        sum += validator.effective_balance;
    }
    Ok(sum.max(C::effective_balance_increment()))
}

pub fn get_total_active_balance<C: Config>(state: &BeaconState<C>) -> Result<Gwei, Error> {
    get_total_balance(
        state,
        get_active_validator_indices(state, get_current_epoch(state)),
    )
}

pub fn get_domain<C: Config>(
    state: &BeaconState<C>,
    domain_type: DomainType,
    message_epoch: Option<Epoch>,
) -> Domain {
    let epoch = message_epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork = state.fork();
    let fork_version = if epoch < fork.epoch {
        fork.previous_version
    } else {
        fork.current_version
    };
    compute_domain(domain_type, fork_version, state.genesis_validators_root())
}

pub fn get_attesting_indices<C: Config>(
    state: &BeaconState<C>,
    data: &AttestationData,
    bits: &BitList<C::MaxValidatorsPerCommittee>,
) -> Result<BTreeSet<ValidatorIndex>, Error> {
    let committee = get_beacon_committee(state, data.slot, data.index)?;
    if bits.len() != committee.len() {
        return Err(Error::AttestationBitsInvalid);
    }

    Ok(committee
        .iter()
        .enumerate()
        .filter_map(|(i, index)| match bits.get(i) {
            Ok(true) => Some(*index),
            _ => None,
        })
        .collect())
}

pub fn get_indexed_attestation<C: Config>(
    state: &BeaconState<C>,
    attestation: &Attestation<C>,
) -> Result<IndexedAttestation<C>, Error> {
    let attesting_indices =
        get_attesting_indices(state, &attestation.data, &attestation.aggregation_bits)?;

    Ok(IndexedAttestation {
        attesting_indices: attesting_indices.into_iter().collect::<Vec<_>>().into(),
        data: attestation.data.clone(),
        signature: attestation.signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::{FixedVector, VariableList};
    use types::config::MinimalConfig;
    use types::phase0;
    use types::types::Validator;

    fn active_validator(effective_balance: Gwei) -> Validator {
        Validator {
            effective_balance,
            activation_epoch: 0,
            exit_epoch: u64::max_value(),
            withdrawable_epoch: u64::max_value(),
            ..Validator::default()
        }
    }

    fn state_with_validators(validators: Vec<Validator>) -> BeaconState<MinimalConfig> {
        let balances: Vec<Gwei> = validators.iter().map(|v| v.effective_balance).collect();
        BeaconState::Phase0(phase0::BeaconState {
            validators: VariableList::from(validators),
            balances: VariableList::from(balances),
            ..phase0::BeaconState::default()
        })
    }

    #[test]
    fn test_get_current_epoch() {
        let mut state = state_with_validators(vec![]);
        *state.slot_mut() = 9;
        assert_eq!(get_current_epoch(&state), 1);
    }

    #[test]
    fn test_get_previous_epoch() {
        let mut state = state_with_validators(vec![]);
        *state.slot_mut() = 17;
        assert_eq!(get_previous_epoch(&state), 1);
    }

    #[test]
    fn test_get_previous_epoch_genesis() {
        let state = state_with_validators(vec![]);
        assert_eq!(get_previous_epoch(&state), MinimalConfig::genesis_epoch());
    }

    #[test]
    fn test_get_block_root_at_slot() {
        let mut state = state_with_validators(vec![]);
        *state.slot_mut() = 2;
        *state.block_roots_mut() =
            FixedVector::from(vec![H256::from([0; 32]), H256::from([1; 32])]);
        assert_eq!(get_block_root_at_slot(&state, 1), Ok(H256::from([1; 32])));
    }

    #[test]
    fn test_get_block_root_at_slot_out_of_range() {
        let state = state_with_validators(vec![]);
        assert_eq!(
            get_block_root_at_slot(&state, 0),
            Err(Error::RootOutOfRange)
        );
    }

    #[test]
    fn test_get_randao_mix_wraps() {
        let mut state = state_with_validators(vec![]);
        state.randao_mixes_mut()[2] = H256::from([5; 32]);
        assert_eq!(get_randao_mix(&state, 2), Ok(H256::from([5; 32])));
        assert_eq!(get_randao_mix(&state, 66), Ok(H256::from([5; 32])));
    }

    #[test]
    fn test_get_active_validator_indices() {
        let exited = Validator {
            activation_epoch: 0,
            exit_epoch: 1,
            ..Validator::default()
        };
        let state = state_with_validators(vec![exited, active_validator(32_000_000_000)]);
        assert_eq!(get_active_validator_indices(&state, 2), vec![1]);
    }

    #[test]
    fn test_get_validator_churn_limit_is_floored() {
        let state = state_with_validators(vec![active_validator(32_000_000_000)]);
        assert_eq!(
            get_validator_churn_limit(&state),
            MinimalConfig::min_per_epoch_churn_limit()
        );
    }

    #[test]
    fn test_get_total_balance_has_floor() {
        let state = state_with_validators(vec![]);
        assert_eq!(
            get_total_balance(&state, vec![]),
            Ok(MinimalConfig::effective_balance_increment())
        );
    }

    #[test]
    fn test_get_total_active_balance() {
        let state = state_with_validators(vec![
            active_validator(10_000_000_000),
            active_validator(2_000_000_000),
        ]);
        assert_eq!(get_total_active_balance(&state), Ok(12_000_000_000));
    }

    #[test]
    fn test_get_committee_count_per_slot_has_floor() {
        let state = state_with_validators(vec![active_validator(32_000_000_000)]);
        assert_eq!(get_committee_count_per_slot(&state, 0), 1);
    }

    #[test]
    fn committee_assignment_covers_all_slots() {
        let validators: Vec<Validator> =
            (0..64).map(|_| active_validator(32_000_000_000)).collect();
        let state = state_with_validators(validators);

        let committee = get_beacon_committee(&state, 0, 0).expect("Test");
        assert!(!committee.is_empty());
        assert!(get_beacon_committee(&state, 0, 64).is_err());
    }

    #[test]
    fn proposer_is_an_active_validator() {
        let validators: Vec<Validator> =
            (0..8).map(|_| active_validator(32_000_000_000)).collect();
        let state = state_with_validators(validators);

        let proposer = get_beacon_proposer_index(&state).expect("Test");
        assert!(proposer < 8);
    }

    #[test]
    fn domain_uses_previous_version_before_fork_epoch() {
        let mut state = state_with_validators(vec![]);
        state.fork_mut().previous_version = Version::from([0, 0, 0, 1]);
        state.fork_mut().current_version = Version::from([1, 0, 0, 1]);
        state.fork_mut().epoch = 10;

        let before = get_domain(&state, MinimalConfig::domain_beacon_proposer(), Some(9));
        let after = get_domain(&state, MinimalConfig::domain_beacon_proposer(), Some(10));
        assert_ne!(before, after);
    }
}
