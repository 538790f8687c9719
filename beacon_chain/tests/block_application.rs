//! End-to-end application of a block through the chain store: kickstart a
//! minimal-preset genesis, build an empty block on top of it, and let the
//! store compute and index the post-state.

use std::sync::Arc;

use ethereum_types::H256;

use beacon_chain::{ChainEntry, HotColdChain, MemStateDb, Step};
use helper_functions::beacon_state_accessors::get_beacon_proposer_index;
use helper_functions::crypto::hash_tree_root;
use transition_functions::genesis::{kick_start_state, KickstartValidatorData};
use transition_functions::{process_slots, NoopExecutionEngine};
use types::cancel::Cancellation;
use types::config::{ForkSchedule, MinimalConfig};
use types::phase0;
use types::primitives::{PublicKeyBytes, SignatureBytes};
use types::{BeaconState, SignedBeaconBlock};

type C = MinimalConfig;

fn genesis_state() -> BeaconState<C> {
    let validators: Vec<KickstartValidatorData> = (0..64)
        .map(|i: u8| {
            let mut pubkey = [0; 48];
            pubkey[0] = 0xb0;
            pubkey[1] = i;
            KickstartValidatorData {
                pubkey: PublicKeyBytes(pubkey),
                withdrawal_credentials: H256::repeat_byte(i),
                balance: 32_000_000_000,
            }
        })
        .collect();
    kick_start_state::<C>(H256::repeat_byte(0x42), 1_577_836_800, &validators)
        .expect("kickstart genesis should succeed")
}

fn genesis_entry(state: BeaconState<C>) -> ChainEntry<C> {
    let mut closed_header = state.latest_block_header().clone();
    closed_header.state_root = state.tree_hash_root();
    let block_root = hash_tree_root(&closed_header);

    let epoch_context =
        epoch_context::EpochContext::for_state(&state).expect("genesis has active validators");
    ChainEntry::new(
        Step::new(0, true),
        block_root,
        H256::zero(),
        Arc::new(state),
        Arc::new(epoch_context),
    )
}

#[test]
fn applying_an_empty_block_through_the_store() {
    let schedule = ForkSchedule::default();
    let cancellation = Cancellation::new();
    let state = genesis_state();
    let genesis = genesis_entry(state.clone());
    let genesis_root = genesis.block_root();

    let chain = HotColdChain::new(
        genesis,
        Arc::new(MemStateDb::new()),
        Box::new(|_: &ChainEntry<C>, _| {}),
    );

    // Work out the proposer and post-state root the way a block producer
    // would: on a copy advanced to the target slot.
    let mut working = state;
    process_slots(&mut working, 1, &schedule, &cancellation).expect("empty slot transition");
    let proposer_index = get_beacon_proposer_index(&working).expect("proposer exists");

    let mut block = phase0::BeaconBlock::<C> {
        slot: 1,
        proposer_index,
        parent_root: genesis_root,
        state_root: H256::zero(),
        body: Default::default(),
    };

    let mut simulated = working.clone();
    transition_functions::blocks::process_block(
        &mut simulated,
        &SignedBeaconBlock::Phase0(phase0::SignedBeaconBlock {
            message: block.clone(),
            signature: SignatureBytes::empty(),
        }),
        &NoopExecutionEngine,
        false,
        &cancellation,
    )
    .expect("block simulation");
    block.state_root = simulated.tree_hash_root();

    let signed = SignedBeaconBlock::Phase0(phase0::SignedBeaconBlock {
        message: block,
        signature: SignatureBytes::empty(),
    });

    let entry = chain
        .extend(&signed, &schedule, &NoopExecutionEngine, false, &cancellation)
        .expect("block application");

    // The header is incorporated and names the genesis header as parent.
    let post_state = entry.state();
    assert_eq!(post_state.latest_block_header().slot, 1);
    assert_eq!(post_state.latest_block_header().parent_root, genesis_root);
    assert_eq!(post_state.slot(), 1);

    // The store indexes the entry by block root, state root, and step.
    assert!(chain.by_block(entry.block_root()).is_some());
    assert!(chain.by_state_root(entry.state_root()).is_some());
    assert!(chain.by_block_slot(entry.block_root(), 1).is_some());

    chain.set_head(entry.block_root()).expect("head update");
    assert_eq!(chain.head().block_root(), entry.block_root());
    assert!(chain
        .by_canon_step(Step::new(1, true))
        .is_some());

    // Applying the same block again is a no-op, not an error.
    chain
        .extend(&signed, &schedule, &NoopExecutionEngine, false, &cancellation)
        .expect("duplicate application is ignored");
}

#[test]
fn a_block_with_a_wrong_state_root_is_rejected() {
    let schedule = ForkSchedule::default();
    let cancellation = Cancellation::new();
    let state = genesis_state();
    let genesis = genesis_entry(state.clone());
    let genesis_root = genesis.block_root();

    let chain = HotColdChain::new(
        genesis,
        Arc::new(MemStateDb::new()),
        Box::new(|_: &ChainEntry<C>, _| {}),
    );

    let mut working = state;
    process_slots(&mut working, 1, &schedule, &cancellation).expect("empty slot transition");
    let proposer_index = get_beacon_proposer_index(&working).expect("proposer exists");

    let signed = SignedBeaconBlock::Phase0(phase0::SignedBeaconBlock {
        message: phase0::BeaconBlock::<C> {
            slot: 1,
            proposer_index,
            parent_root: genesis_root,
            state_root: H256::repeat_byte(0xba),
            body: Default::default(),
        },
        signature: SignatureBytes::empty(),
    });

    assert!(chain
        .extend(&signed, &schedule, &NoopExecutionEngine, false, &cancellation)
        .is_err());
    // The failed application left no trace in the store.
    assert!(chain.by_block(signed.message_root()).is_none());
}
