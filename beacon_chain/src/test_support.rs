use std::sync::Arc;

use ethereum_types::H256;

use epoch_context::EpochContext;
use helper_functions::crypto::hash_tree_root;
use transition_functions::genesis::{kick_start_state, KickstartValidatorData};
use types::config::Config;
use types::primitives::PublicKeyBytes;

use crate::entry::ChainEntry;
use crate::step::Step;

/// A kickstarted genesis entry. Its block root is the root of the closed
/// genesis header, which is what a block building on it must name as parent.
pub fn genesis_entry<C: Config>(validator_count: u8) -> ChainEntry<C> {
    let validators: Vec<KickstartValidatorData> = (0..validator_count)
        .map(|i| {
            let mut pubkey = [0; 48];
            pubkey[0] = 0xc0;
            pubkey[1] = i;
            KickstartValidatorData {
                pubkey: PublicKeyBytes(pubkey),
                withdrawal_credentials: H256::repeat_byte(i),
                balance: 32_000_000_000,
            }
        })
        .collect();

    let state =
        kick_start_state::<C>(H256::repeat_byte(0x42), 1_577_836_800, &validators)
            .expect("kickstart genesis should succeed");

    let mut closed_header = state.latest_block_header().clone();
    closed_header.state_root = state.tree_hash_root();
    let block_root = hash_tree_root(&closed_header);

    let epoch_context =
        EpochContext::for_state(&state).expect("genesis state has active validators");
    ChainEntry::new(
        Step::new(0, true),
        block_root,
        H256::zero(),
        Arc::new(state),
        Arc::new(epoch_context),
    )
}

/// A synthetic descendant entry. The state is not a real transition result,
/// only distinct enough to give the entry unique roots.
pub fn entry_after<C: Config>(
    parent: &ChainEntry<C>,
    slot: u64,
    block_root: H256,
    parent_root: H256,
) -> ChainEntry<C> {
    let mut state = (*parent.state()).clone();
    *state.slot_mut() = slot;
    *state.genesis_time_mut() = parent.state().genesis_time() + u64::from(block_root[0]);

    ChainEntry::new(
        Step::new(slot, true),
        block_root,
        parent_root,
        Arc::new(state),
        parent.epoch_context(),
    )
}
