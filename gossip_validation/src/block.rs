use helper_functions::beacon_state_accessors::{get_beacon_proposer_index, get_domain};
use helper_functions::crypto::{bls_verify, hash_tree_root};
use helper_functions::misc::compute_start_slot_at_epoch;
use types::config::Config;
use types::types::SigningData;
use types::SignedBeaconBlock;

use crate::outcome::{catchup_state, GossipBackend, Outcome};
use crate::{CATCHUP_TIMEOUT, MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS};

/// Gossip classification of an inbound signed block.
pub fn validate_block<C: Config>(
    signed_block: &SignedBeaconBlock<C>,
    backend: &impl GossipBackend<C>,
) -> Outcome {
    let chain = backend.chain();
    let slot = signed_block.slot();

    // Blocks from the future are held back, not penalised.
    if slot > backend.current_slot() + MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS {
        return Outcome::Ignore("block is from a future slot");
    }

    let finalized = chain.finalized_checkpoint();
    if slot <= compute_start_slot_at_epoch::<C>(finalized.epoch) {
        return Outcome::Ignore("block is not later than the finalised slot");
    }

    if backend.seen_block_proposal(slot, signed_block.proposer_index()) {
        return Outcome::Ignore("proposal for this slot already seen");
    }

    let parent = match chain.by_block(signed_block.parent_root()) {
        Some(parent) => parent,
        None => return Outcome::Ignore("parent block unknown"),
    };
    if parent.step().slot() >= slot {
        return Outcome::Reject("block does not descend from its parent slot");
    }

    match chain.in_subtree(finalized.root, signed_block.parent_root()) {
        (true, _) => return Outcome::Ignore("parent ancestry unknown"),
        (false, false) => {
            return Outcome::Reject("block does not descend from the finalised root")
        }
        (false, true) => {}
    }

    // Proposer and signature checks need the parent state advanced to the
    // block's slot.
    let state = match catchup_state(
        &parent.state(),
        slot,
        &backend.fork_schedule(),
        CATCHUP_TIMEOUT,
    ) {
        Ok(state) => state,
        Err(outcome) => return outcome,
    };

    let expected_proposer = match get_beacon_proposer_index(&state) {
        Ok(proposer) => proposer,
        Err(_) => return Outcome::Ignore("proposer cannot be computed"),
    };
    if signed_block.proposer_index() != expected_proposer {
        return Outcome::Reject("wrong proposer for the slot");
    }

    let proposer_pubkey = match state.validators().get(expected_proposer as usize) {
        Some(validator) => validator.pubkey,
        None => return Outcome::Ignore("proposer pubkey unknown"),
    };
    let domain = get_domain(&state, C::domain_beacon_proposer(), None);
    let signing_root = hash_tree_root(&SigningData {
        object_root: signed_block.message_root(),
        domain,
    });
    if !bls_verify(&proposer_pubkey, signing_root, signed_block.signature()) {
        return Outcome::Reject("invalid proposer signature");
    }

    Outcome::Accept
}
