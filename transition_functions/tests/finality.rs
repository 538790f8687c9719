//! Multi-epoch transitions with full attestation participation must justify
//! and finalise: after a supermajority keeps voting for four epochs the
//! finalised checkpoint trails the current epoch by two.

use ethereum_types::H256;

use helper_functions::beacon_state_accessors::{
    get_beacon_committee, get_block_root, get_block_root_at_slot, get_committee_count_per_slot,
    get_current_epoch, get_previous_epoch,
};
use transition_functions::blocks::block_processing::{
    process_attestation_altair, process_attestation_phase0,
};
use transition_functions::genesis::{kick_start_state, KickstartValidatorData};
use transition_functions::process_slots;
use transition_functions::upgrades::upgrade_to_altair;
use types::cancel::Cancellation;
use types::config::{ForkName, ForkSchedule, MinimalConfig};
use types::primitives::{PublicKeyBytes, SignatureBytes, Slot};
use types::types::{Attestation, AttestationData, Checkpoint};
use types::BeaconState;

type C = MinimalConfig;

fn genesis_state() -> BeaconState<C> {
    let validators: Vec<KickstartValidatorData> = (0..64)
        .map(|i: u8| {
            let mut pubkey = [0; 48];
            pubkey[0] = 0xd0;
            pubkey[1] = i;
            KickstartValidatorData {
                pubkey: PublicKeyBytes(pubkey),
                withdrawal_credentials: H256::repeat_byte(i),
                balance: 32_000_000_000,
            }
        })
        .collect();
    kick_start_state::<C>(H256::repeat_byte(0x42), 1_577_836_800, &validators).expect("genesis")
}

/// Full-participation attestations for `slot`, built against the state at
/// the inclusion slot.
fn attestations_for_slot(state: &BeaconState<C>, slot: Slot) -> Vec<Attestation<C>> {
    let epoch = slot / 8;
    let is_current = epoch == get_current_epoch(state);
    let source = if is_current {
        *state.current_justified_checkpoint()
    } else {
        *state.previous_justified_checkpoint()
    };

    let committee_count = get_committee_count_per_slot(state, epoch);
    (0..committee_count)
        .map(|index| {
            let committee = get_beacon_committee(state, slot, index).expect("committee");
            let mut bits = ssz::BitList::with_capacity(committee.len()).expect("bits");
            for i in 0..committee.len() {
                bits.set(i, true).expect("bits");
            }

            Attestation {
                aggregation_bits: bits,
                data: AttestationData {
                    slot,
                    index,
                    beacon_block_root: get_block_root_at_slot(state, slot).expect("head root"),
                    source,
                    target: Checkpoint {
                        epoch,
                        root: get_block_root(state, epoch).expect("target root"),
                    },
                },
                signature: SignatureBytes::empty(),
            }
        })
        .collect()
}

fn run_with_full_participation(state: &mut BeaconState<C>, slots: Slot) {
    let schedule = ForkSchedule::default();
    let cancellation = Cancellation::new();

    for slot in 1..=slots {
        let pre_finalized = state.finalized_checkpoint().epoch;

        process_slots(state, slot, &schedule, &cancellation).expect("slot transition");

        for attestation in attestations_for_slot(state, slot - 1) {
            match state.fork_name() {
                ForkName::Phase0 => {
                    process_attestation_phase0(state, &attestation, false).expect("attestation")
                }
                _ => process_attestation_altair(state, &attestation, false)
                    .expect("attestation"),
            }
        }

        // Finality never rewinds.
        assert!(state.finalized_checkpoint().epoch >= pre_finalized);
        assert_eq!(state.slot(), slot);
    }
}

#[test]
fn phase0_finalizes_with_full_participation() {
    let mut state = genesis_state();

    // Five full epochs of the minimal preset.
    run_with_full_participation(&mut state, 40);

    assert_eq!(get_current_epoch(&state), 5);
    assert_eq!(get_previous_epoch(&state), 4);
    // Supermajority target votes in every epoch: the head epoch stays two
    // ahead of finality.
    assert!(state.current_justified_checkpoint().epoch >= 3);
    assert_eq!(
        state.finalized_checkpoint().epoch,
        state.current_justified_checkpoint().epoch - 1
    );
    assert!(state.finalized_checkpoint().epoch >= 3);

    // Registry parallelism holds after the whole run.
    assert_eq!(state.validators().len(), state.balances().len());
}

#[test]
fn altair_finalizes_with_full_participation() {
    let mut state = match genesis_state() {
        BeaconState::Phase0(inner) => {
            BeaconState::Altair(upgrade_to_altair(inner).expect("upgrade"))
        }
        _ => unreachable!(),
    };

    run_with_full_participation(&mut state, 40);

    assert!(state.current_justified_checkpoint().epoch >= 3);
    assert!(state.finalized_checkpoint().epoch >= 2);

    let participation_len = state
        .previous_epoch_participation()
        .expect("altair state")
        .len();
    assert_eq!(participation_len, state.validators().len());
    assert_eq!(
        state.inactivity_scores().expect("altair state").len(),
        state.validators().len()
    );
}

#[test]
fn without_attestations_nothing_finalizes() {
    let mut state = genesis_state();
    let schedule = ForkSchedule::default();
    let cancellation = Cancellation::new();

    for slot in 1..=40 {
        process_slots(&mut state, slot, &schedule, &cancellation).expect("slot transition");
    }

    assert_eq!(state.current_justified_checkpoint().epoch, 0);
    assert_eq!(state.finalized_checkpoint().epoch, 0);
}
