use typenum::Unsigned;

use helper_functions::beacon_state_accessors::{
    get_active_validator_indices, get_current_epoch, get_seed,
};
use helper_functions::crypto::hash;
use helper_functions::math::int_to_bytes;
use helper_functions::misc::compute_shuffled_index;
use types::altair::SyncCommittee;
use types::config::Config;
use types::primitives::PublicKeyBytes;
use types::BeaconState;

use crate::error::Error;

/// Weighted selection (with repetition) of the sync committee serving from
/// the next epoch.
pub fn derive_next_sync_committee<C: Config>(
    state: &BeaconState<C>,
) -> Result<SyncCommittee<C>, Error> {
    const MAX_RANDOM_BYTE: u64 = u8::max_value() as u64;

    let epoch = get_current_epoch(state) + 1;
    let indices = get_active_validator_indices(state, epoch);
    if indices.is_empty() {
        return Err(Error::Helper(helper_functions::Error::NoActiveValidators));
    }

    let seed = get_seed(state, epoch, C::domain_sync_committee())?;
    let total = indices.len() as u64;

    let mut pubkeys: Vec<PublicKeyBytes> = Vec::with_capacity(C::SyncCommitteeSize::to_usize());
    let mut i = 0_u64;
    while pubkeys.len() < C::SyncCommitteeSize::to_usize() {
        let shuffled = compute_shuffled_index::<C>(i % total, total, seed)?;
        let candidate = indices[shuffled as usize];

        let mut preimage = seed.as_bytes().to_vec();
        preimage.append(&mut int_to_bytes(i / 32, 8));
        let random_byte = u64::from(hash(&preimage)[(i % 32) as usize]);

        let validator = &state.validators()[candidate as usize];
        if validator.effective_balance * MAX_RANDOM_BYTE
            >= C::max_effective_balance() * random_byte
        {
            pubkeys.push(validator.pubkey);
        }
        i += 1;
    }

    let aggregate_pubkey = bls::aggregate_pubkeys(&pubkeys);

    Ok(SyncCommittee {
        pubkeys: pubkeys.into(),
        aggregate_pubkey,
    })
}

/// At a sync-committee period boundary the next committee becomes current
/// and a fresh next committee is derived.
pub fn process_sync_committee_updates<C: Config>(
    state: &mut BeaconState<C>,
) -> Result<(), Error> {
    let next_epoch = get_current_epoch(state) + 1;
    if next_epoch % C::epochs_per_sync_committee_period() != 0 {
        return Ok(());
    }

    let derived = derive_next_sync_committee(state)?;

    let current = state
        .next_sync_committee()
        .ok_or(helper_functions::Error::WrongFork)?
        .clone();
    *state
        .current_sync_committee_mut()
        .ok_or(helper_functions::Error::WrongFork)? = current;
    *state
        .next_sync_committee_mut()
        .ok_or(helper_functions::Error::WrongFork)? = derived;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::VariableList;
    use types::altair;
    use types::config::MinimalConfig;
    use types::types::Validator;

    fn pubkey(byte: u8) -> PublicKeyBytes {
        let mut bytes = [0; 48];
        bytes[0] = byte;
        PublicKeyBytes(bytes)
    }

    fn altair_state(count: u8, slot: u64) -> BeaconState<MinimalConfig> {
        let validators: Vec<Validator> = (0..count)
            .map(|i| Validator {
                pubkey: pubkey(i),
                effective_balance: 32_000_000_000,
                activation_epoch: 0,
                exit_epoch: u64::max_value(),
                withdrawable_epoch: u64::max_value(),
                ..Validator::default()
            })
            .collect();
        let balances: Vec<u64> = validators.iter().map(|v| v.effective_balance).collect();
        BeaconState::Altair(altair::BeaconState {
            slot,
            validators: VariableList::from(validators),
            balances: VariableList::from(balances),
            previous_epoch_participation: VariableList::from(vec![0; count as usize]),
            current_epoch_participation: VariableList::from(vec![0; count as usize]),
            inactivity_scores: VariableList::from(vec![0; count as usize]),
            ..altair::BeaconState::default()
        })
    }

    #[test]
    fn committee_is_filled_to_size() {
        let state = altair_state(16, 0);
        let committee = derive_next_sync_committee(&state).expect("Test");
        assert_eq!(committee.pubkeys.len(), 32);
    }

    #[test]
    fn members_are_drawn_from_the_registry() {
        let state = altair_state(16, 0);
        let committee = derive_next_sync_committee(&state).expect("Test");

        for member in committee.pubkeys.iter() {
            assert!(state
                .validators()
                .iter()
                .any(|validator| validator.pubkey == *member));
        }
    }

    #[test]
    fn rotation_happens_only_at_period_boundaries() {
        // Minimal preset: 8 epochs per period, 8 slots per epoch. Slot 55 is
        // the last slot of epoch 6, so next_epoch = 7 is not a boundary.
        let mut state = altair_state(16, 55);
        let next_before = state.next_sync_committee().expect("Test").clone();
        process_sync_committee_updates(&mut state).expect("Test");
        assert_eq!(state.next_sync_committee().expect("Test"), &next_before);

        // Slot 63 is the last slot of epoch 7; next_epoch = 8 is a boundary.
        let mut state = altair_state(16, 63);
        process_sync_committee_updates(&mut state).expect("Test");
        assert_eq!(
            state.current_sync_committee().expect("Test"),
            &next_before
        );
        assert!(!state
            .next_sync_committee()
            .expect("Test")
            .pubkeys
            .is_empty());
    }
}
