use std::sync::Arc;

use ethereum_types::H256;

use epoch_context::EpochContext;
use types::config::Config;
use types::BeaconState;

use crate::step::Step;

/// One step of a chain: the state after slot processing, possibly after
/// block processing. Entries share their state and epoch context through
/// `Arc`, so cloning is cheap and concurrent readers are safe.
#[derive(Clone)]
pub struct ChainEntry<C: Config> {
    step: Step,
    /// The last block root at this step; an empty slot repeats its
    /// ancestor's block root.
    block_root: H256,
    parent_root: H256,
    state_root: H256,
    state: Arc<BeaconState<C>>,
    epoch_context: Arc<EpochContext<C>>,
}

impl<C: Config> ChainEntry<C> {
    pub fn new(
        step: Step,
        block_root: H256,
        parent_root: H256,
        state: Arc<BeaconState<C>>,
        epoch_context: Arc<EpochContext<C>>,
    ) -> Self {
        let state_root = state.tree_hash_root();
        Self {
            step,
            block_root,
            parent_root,
            state_root,
            state,
            epoch_context,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn block_root(&self) -> H256 {
        self.block_root
    }

    pub fn parent_root(&self) -> H256 {
        self.parent_root
    }

    pub fn state_root(&self) -> H256 {
        self.state_root
    }

    pub fn state(&self) -> Arc<BeaconState<C>> {
        Arc::clone(&self.state)
    }

    pub fn epoch_context(&self) -> Arc<EpochContext<C>> {
        Arc::clone(&self.epoch_context)
    }

    /// Whether this entry includes block processing of its own block, as
    /// opposed to being an empty-slot snapshot.
    pub fn is_empty_slot(&self) -> bool {
        !self.step.block()
    }
}

/// A query result annotated with whether the entry was canonical at the
/// moment of the query.
#[derive(Clone)]
pub struct SearchEntry<C: Config> {
    pub entry: ChainEntry<C>,
    pub canonical: bool,
}

/// Invoked under the chain lock as entries migrate out of the hot tier on
/// finalisation. Canonical entries are the newly-cold linear history;
/// non-canonical ones are pruned forks.
pub trait BlockSink<C: Config>: Send {
    fn on_migrated_entry(&mut self, entry: &ChainEntry<C>, canonical: bool);
}

impl<C: Config, F: FnMut(&ChainEntry<C>, bool) + Send> BlockSink<C> for F {
    fn on_migrated_entry(&mut self, entry: &ChainEntry<C>, canonical: bool) {
        self(entry, canonical)
    }
}
