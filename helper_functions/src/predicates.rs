use ethereum_types::H256;
use typenum::Unsigned;

use types::config::Config;
use types::primitives::*;
use types::types::{AttestationData, IndexedAttestation, Validator};
use types::BeaconState;

use crate::beacon_state_accessors::get_domain;
use crate::crypto::{bls_verify_aggregate, hash};
use crate::error::Error;
use crate::misc::compute_signing_root;

pub fn is_active_validator(validator: &Validator, epoch: Epoch) -> bool {
    validator.activation_epoch <= epoch && epoch < validator.exit_epoch
}

pub fn is_slashable_validator(validator: &Validator, epoch: Epoch) -> bool {
    !validator.slashed
        && validator.activation_epoch <= epoch
        && epoch < validator.withdrawable_epoch
}

pub fn is_eligible_for_activation_queue<C: Config>(validator: &Validator) -> bool {
    validator.activation_eligibility_epoch == C::far_future_epoch()
        && validator.effective_balance == C::max_effective_balance()
}

pub fn is_eligible_for_activation<C: Config>(
    state: &BeaconState<C>,
    validator: &Validator,
) -> bool {
    validator.activation_eligibility_epoch <= state.finalized_checkpoint().epoch
        && validator.activation_epoch == C::far_future_epoch()
}

pub fn is_slashable_attestation_data(data_1: &AttestationData, data_2: &AttestationData) -> bool {
    // Double vote
    (data_1 != data_2 && data_1.target.epoch == data_2.target.epoch) ||
    // Surround vote
    (data_1.source.epoch < data_2.source.epoch && data_2.target.epoch < data_1.target.epoch)
}

/// Structural checks always run; the aggregate signature only when
/// `verify_signature` is set.
pub fn validate_indexed_attestation<C: Config>(
    state: &BeaconState<C>,
    indexed_attestation: &IndexedAttestation<C>,
    verify_signature: bool,
) -> Result<(), Error> {
    let indices = &indexed_attestation.attesting_indices;

    if indices.is_empty() {
        return Err(Error::NoAttestingIndices);
    }
    if indices.len() > C::MaxValidatorsPerCommittee::to_usize() {
        return Err(Error::MaxIndicesExceeded);
    }
    if !indices.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(Error::BadValidatorIndicesOrdering);
    }

    let mut pubkeys = Vec::with_capacity(indices.len());
    for index in indices.iter() {
        let validator = state
            .validators()
            .get(*index as usize)
            .ok_or(Error::IndexOutOfRange)?;
        pubkeys.push(validator.pubkey);
    }

    if verify_signature {
        let domain = get_domain(
            state,
            C::domain_beacon_attester(),
            Some(indexed_attestation.data.target.epoch),
        );
        let signing_root = compute_signing_root(&indexed_attestation.data, domain);
        if !bls_verify_aggregate(&pubkeys, signing_root, &indexed_attestation.signature) {
            return Err(Error::SignatureInvalid);
        }
    }

    Ok(())
}

pub fn is_valid_merkle_branch(
    leaf: H256,
    branch: &[H256],
    depth: u64,
    index: u64,
    root: H256,
) -> bool {
    let mut value = leaf;

    for i in 0..depth {
        let sibling = match branch.get(i as usize) {
            Some(sibling) => *sibling,
            None => return false,
        };

        let mut preimage = Vec::with_capacity(64);
        if index / (1 << i) % 2 == 0 {
            preimage.extend_from_slice(value.as_bytes());
            preimage.extend_from_slice(sibling.as_bytes());
        } else {
            preimage.extend_from_slice(sibling.as_bytes());
            preimage.extend_from_slice(value.as_bytes());
        }
        value = H256::from_slice(&hash(&preimage));
    }

    value == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::VariableList;
    use types::config::MinimalConfig;
    use types::phase0;
    use types::types::Checkpoint;

    #[test]
    fn test_is_active_validator() {
        let validator = Validator {
            activation_epoch: 0,
            exit_epoch: 1,
            ..Validator::default()
        };
        assert!(is_active_validator(&validator, 0));
        assert!(!is_active_validator(&validator, 1));
    }

    #[test]
    fn test_is_slashable_validator() {
        let validator = Validator {
            slashed: false,
            activation_epoch: 0,
            withdrawable_epoch: 1,
            ..Validator::default()
        };
        assert!(is_slashable_validator(&validator, 0));
        assert!(!is_slashable_validator(&validator, 1));

        let slashed = Validator {
            slashed: true,
            ..validator
        };
        assert!(!is_slashable_validator(&slashed, 0));
    }

    #[test]
    fn test_is_slashable_attestation_data_double_vote() {
        let data_1 = AttestationData {
            target: Checkpoint {
                epoch: 1,
                root: H256::from([0; 32]),
            },
            ..AttestationData::default()
        };
        let data_2 = AttestationData {
            target: Checkpoint {
                epoch: 1,
                root: H256::from([1; 32]),
            },
            ..AttestationData::default()
        };
        assert!(is_slashable_attestation_data(&data_1, &data_2));
        assert!(!is_slashable_attestation_data(&data_1, &data_1));
    }

    #[test]
    fn test_is_slashable_attestation_data_surround_vote() {
        let data_1 = AttestationData {
            source: Checkpoint {
                epoch: 0,
                ..Checkpoint::default()
            },
            target: Checkpoint {
                epoch: 3,
                ..Checkpoint::default()
            },
            ..AttestationData::default()
        };
        let data_2 = AttestationData {
            source: Checkpoint {
                epoch: 1,
                root: H256::from([1; 32]),
            },
            target: Checkpoint {
                epoch: 2,
                ..Checkpoint::default()
            },
            ..AttestationData::default()
        };
        assert!(is_slashable_attestation_data(&data_1, &data_2));
        assert!(!is_slashable_attestation_data(&data_2, &data_1));
    }

    fn state_with_validators(count: usize) -> types::BeaconState<MinimalConfig> {
        let validators: Vec<Validator> = (0..count)
            .map(|_| Validator {
                activation_epoch: 0,
                exit_epoch: u64::max_value(),
                withdrawable_epoch: u64::max_value(),
                ..Validator::default()
            })
            .collect();
        types::BeaconState::Phase0(phase0::BeaconState {
            validators: VariableList::from(validators),
            ..phase0::BeaconState::default()
        })
    }

    #[test]
    fn indexed_attestation_must_have_indices() {
        let state = state_with_validators(4);
        let attestation = IndexedAttestation::<MinimalConfig>::default();
        assert_eq!(
            validate_indexed_attestation(&state, &attestation, false),
            Err(Error::NoAttestingIndices)
        );
    }

    #[test]
    fn indexed_attestation_indices_must_be_sorted_and_unique() {
        let state = state_with_validators(4);
        let attestation = IndexedAttestation::<MinimalConfig> {
            attesting_indices: VariableList::from(vec![2_u64, 1]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            validate_indexed_attestation(&state, &attestation, false),
            Err(Error::BadValidatorIndicesOrdering)
        );

        let duplicated = IndexedAttestation::<MinimalConfig> {
            attesting_indices: VariableList::from(vec![1_u64, 1]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            validate_indexed_attestation(&state, &duplicated, false),
            Err(Error::BadValidatorIndicesOrdering)
        );
    }

    #[test]
    fn indexed_attestation_indices_must_exist() {
        let state = state_with_validators(2);
        let attestation = IndexedAttestation::<MinimalConfig> {
            attesting_indices: VariableList::from(vec![0_u64, 7]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            validate_indexed_attestation(&state, &attestation, false),
            Err(Error::IndexOutOfRange)
        );
    }

    #[test]
    fn structurally_valid_indexed_attestation_passes_without_signature_check() {
        let state = state_with_validators(4);
        let attestation = IndexedAttestation::<MinimalConfig> {
            attesting_indices: VariableList::from(vec![0_u64, 1, 3]),
            ..IndexedAttestation::default()
        };
        assert_eq!(
            validate_indexed_attestation(&state, &attestation, false),
            Ok(())
        );
    }

    #[test]
    fn merkle_branch_of_depth_zero_is_the_root() {
        let leaf = H256::repeat_byte(3);
        assert!(is_valid_merkle_branch(leaf, &[], 0, 0, leaf));
    }

    #[test]
    fn merkle_branch_depth_one() {
        let leaf = H256::repeat_byte(1);
        let sibling = H256::repeat_byte(2);
        let root = ssz::hash_concat(leaf, sibling);
        assert!(is_valid_merkle_branch(leaf, &[sibling], 1, 0, root));
        // As the right child the same branch hashes in the other order.
        assert!(!is_valid_merkle_branch(leaf, &[sibling], 1, 1, root));
        assert!(is_valid_merkle_branch(
            leaf,
            &[sibling],
            1,
            1,
            ssz::hash_concat(sibling, leaf)
        ));
    }

    #[test]
    fn merkle_branch_too_short_fails() {
        let leaf = H256::repeat_byte(1);
        assert!(!is_valid_merkle_branch(leaf, &[], 1, 0, leaf));
    }
}
