use helper_functions::beacon_state_accessors::{
    get_beacon_committee, get_domain, get_indexed_attestation,
};
use helper_functions::crypto::{bls_verify, hash, hash_tree_root};
use helper_functions::math::bytes_to_int;
use helper_functions::misc::{compute_epoch_at_slot, compute_signing_root, compute_start_slot_at_epoch};
use helper_functions::predicates::validate_indexed_attestation;
use types::config::Config;
use types::types::{Attestation, SignedAggregateAndProof};
use types::BeaconState;

use crate::outcome::{state_towards, GossipBackend, Outcome};
use crate::{
    ATTESTATION_PROPAGATION_SLOT_RANGE, CATCHUP_TIMEOUT, MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS,
};

/// Whether the selection proof elects its owner as an aggregator for a
/// committee of the given size.
fn is_aggregator<C: Config>(committee_len: usize, selection_proof: &[u8]) -> bool {
    let modulo = (committee_len as u64 / C::target_aggregators_per_committee()).max(1);
    let digest = hash(selection_proof);
    let mut prefix = [0; 8];
    prefix.copy_from_slice(&digest[..8]);
    bytes_to_int(prefix) % modulo == 0
}

fn check_propagation_window<C: Config>(
    backend: &impl GossipBackend<C>,
    slot: u64,
) -> Result<(), Outcome> {
    // Overflow first, so the arithmetic below cannot wrap.
    if slot.checked_add(ATTESTATION_PROPAGATION_SLOT_RANGE).is_none() {
        return Err(Outcome::Reject("attestation slot overflow"));
    }

    let current_slot = backend.current_slot();
    let minimum = current_slot.saturating_sub(MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS);
    if slot + ATTESTATION_PROPAGATION_SLOT_RANGE < minimum {
        return Err(Outcome::Ignore("attestation slot is too old"));
    }
    if slot > current_slot + MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS {
        return Err(Outcome::Ignore("attestation slot is in the future"));
    }
    Ok(())
}

/// Subtree check against the finalised checkpoint: votes for blocks outside
/// the finalised history are provably wrong, votes for unknown blocks are
/// merely unverifiable.
fn check_finalized_ancestry<C: Config>(
    backend: &impl GossipBackend<C>,
    attestation: &Attestation<C>,
) -> Result<(), Outcome> {
    let chain = backend.chain();
    let finalized = chain.finalized_checkpoint();

    if attestation.data.beacon_block_root == finalized.root {
        if finalized.epoch >= attestation.data.target.epoch {
            return Err(Outcome::Reject("cannot vote for the finalised root as target"));
        }
        return Ok(());
    }

    match chain.in_subtree(finalized.root, attestation.data.beacon_block_root) {
        (true, _) => Err(Outcome::Ignore("unknown block, cannot check ancestry")),
        (false, false) => Err(Outcome::Reject("block is not in the finalised subtree")),
        (false, true) => Ok(()),
    }
}

pub fn validate_aggregate_and_proof<C: Config>(
    signed_aggregate: &SignedAggregateAndProof<C>,
    backend: &impl GossipBackend<C>,
) -> Outcome {
    let message = &signed_aggregate.message;
    let attestation = &message.aggregate;
    let data = &attestation.data;

    if let Err(outcome) = check_propagation_window(backend, data.slot) {
        return outcome;
    }

    if data.target.epoch != compute_epoch_at_slot::<C>(data.slot) {
        return Outcome::Reject("attestation epoch does not match its target");
    }

    if backend.seen_aggregator(data.target.epoch, message.aggregator_index) {
        return Outcome::Ignore("aggregator already seen this epoch");
    }
    if backend.seen_aggregate(hash_tree_root(attestation)) {
        return Outcome::Ignore("aggregate already seen");
    }

    if attestation.aggregation_bits.num_set_bits() < 1 {
        return Outcome::Reject("aggregate has no participants");
    }

    if backend.is_bad_block(data.beacon_block_root) {
        return Outcome::Reject("aggregate votes for an invalid block");
    }

    if let Err(outcome) = check_finalized_ancestry(backend, attestation) {
        return outcome;
    }

    // The remaining checks need the state at the target epoch; catch up to
    // it under a deadline.
    let target_start_slot = compute_start_slot_at_epoch::<C>(data.target.epoch);
    let state = match state_towards(
        backend.chain(),
        data.target.root,
        target_start_slot,
        &backend.fork_schedule(),
        CATCHUP_TIMEOUT,
    ) {
        Ok(state) => state,
        Err(outcome) => return outcome,
    };

    let committee = match get_beacon_committee(&state, data.slot, data.index) {
        Ok(committee) => committee,
        Err(_) => return Outcome::Reject("committee index out of range"),
    };
    if !committee.contains(&message.aggregator_index) {
        return Outcome::Reject("aggregator is not in the committee");
    }
    if !is_aggregator::<C>(
        committee.len(),
        message.selection_proof.as_bytes(),
    ) {
        return Outcome::Reject("selection proof does not elect an aggregator");
    }

    if let Err(outcome) = verify_aggregator_signatures(&state, signed_aggregate) {
        return outcome;
    }

    let indexed = match get_indexed_attestation(&state, attestation) {
        Ok(indexed) => indexed,
        Err(_) => return Outcome::Reject("attestation does not convert to indexed form"),
    };
    if validate_indexed_attestation(&state, &indexed, true).is_err() {
        return Outcome::Reject("invalid indexed attestation");
    }

    Outcome::Accept
}

fn verify_aggregator_signatures<C: Config>(
    state: &BeaconState<C>,
    signed_aggregate: &SignedAggregateAndProof<C>,
) -> Result<(), Outcome> {
    let message = &signed_aggregate.message;
    let data = &message.aggregate.data;

    let aggregator_pubkey = match state.validators().get(message.aggregator_index as usize) {
        Some(validator) => validator.pubkey,
        None => return Err(Outcome::Ignore("aggregator pubkey unknown")),
    };

    // The proof signs the slot under the selection-proof domain.
    let selection_domain = get_domain(
        state,
        C::domain_selection_proof(),
        Some(compute_epoch_at_slot::<C>(data.slot)),
    );
    let selection_root = compute_signing_root(&data.slot, selection_domain);
    if !bls_verify(&aggregator_pubkey, selection_root, &message.selection_proof) {
        return Err(Outcome::Reject("invalid selection proof"));
    }

    let aggregate_domain = get_domain(
        state,
        C::domain_aggregate_and_proof(),
        Some(data.target.epoch),
    );
    let aggregate_root = compute_signing_root(message, aggregate_domain);
    if !bls_verify(
        &aggregator_pubkey,
        aggregate_root,
        &signed_aggregate.signature,
    ) {
        return Err(Outcome::Reject("invalid aggregator signature"));
    }

    Ok(())
}

/// Validation of an unaggregated attestation from an attestation subnet.
pub fn validate_attestation<C: Config>(
    attestation: &Attestation<C>,
    backend: &impl GossipBackend<C>,
) -> Outcome {
    let data = &attestation.data;

    if let Err(outcome) = check_propagation_window(backend, data.slot) {
        return outcome;
    }

    if data.target.epoch != compute_epoch_at_slot::<C>(data.slot) {
        return Outcome::Reject("attestation epoch does not match its target");
    }

    // Exactly one participant on the subnets.
    if attestation.aggregation_bits.num_set_bits() != 1 {
        return Outcome::Reject("unaggregated attestation must have one participant");
    }

    if backend.is_bad_block(data.beacon_block_root) {
        return Outcome::Reject("attestation votes for an invalid block");
    }

    if let Err(outcome) = check_finalized_ancestry(backend, attestation) {
        return outcome;
    }

    let target_start_slot = compute_start_slot_at_epoch::<C>(data.target.epoch);
    let state = match state_towards(
        backend.chain(),
        data.target.root,
        target_start_slot,
        &backend.fork_schedule(),
        CATCHUP_TIMEOUT,
    ) {
        Ok(state) => state,
        Err(outcome) => return outcome,
    };

    let committee_size = match get_beacon_committee(&state, data.slot, data.index) {
        Ok(committee) => committee.len(),
        Err(_) => return Outcome::Reject("committee index out of range"),
    };
    if attestation.aggregation_bits.len() != committee_size {
        return Outcome::Reject("aggregation bits do not match the committee");
    }

    let indexed = match get_indexed_attestation(&state, attestation) {
        Ok(indexed) => indexed,
        Err(_) => return Outcome::Reject("attestation does not convert to indexed form"),
    };
    if validate_indexed_attestation(&state, &indexed, true).is_err() {
        return Outcome::Reject("invalid attestation signature");
    }

    Outcome::Accept
}
