use std::sync::{Arc, Mutex};

use anyhow::{ensure, Result};
use ethereum_types::H256;
use log::info;

use epoch_context::EpochContext;
use transition_functions::{state_transition, ExecutionEngine};
use types::cancel::Cancellation;
use types::config::{Config, ForkSchedule};
use types::primitives::{Slot, UnixSeconds};
use types::types::Checkpoint;
use types::SignedBeaconBlock;

use crate::cold::ColdChain;
use crate::entry::{BlockSink, ChainEntry, SearchEntry};
use crate::error::Error;
use crate::hot::HotChain;
use crate::state_db::StateDb;
use crate::step::Step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GenesisInfo {
    pub time: UnixSeconds,
    pub validators_root: H256,
}

/// The two-tier chain store. One coarse mutex serialises structural changes
/// and makes combined hot/cold queries consistent: a finalisation migration
/// is atomic with respect to every query.
///
/// Queries try the hot tier first and fall back to the cold tier, so an
/// entry migrating mid-query is never missed. `search` may therefore return
/// an entry twice; this is documented behaviour.
pub struct HotColdChain<C: Config> {
    inner: Mutex<Inner<C>>,
    genesis: GenesisInfo,
}

struct Inner<C: Config> {
    hot: HotChain<C>,
    cold: ColdChain<C>,
    finalized: Checkpoint,
    sink: Box<dyn BlockSink<C>>,
}

impl<C: Config> HotColdChain<C> {
    pub fn new(
        anchor: ChainEntry<C>,
        state_db: Arc<dyn StateDb<C>>,
        sink: Box<dyn BlockSink<C>>,
    ) -> Self {
        let anchor_state = anchor.state();
        let genesis = GenesisInfo {
            time: anchor_state.genesis_time(),
            validators_root: anchor_state.genesis_validators_root(),
        };
        let mut finalized = *anchor_state.finalized_checkpoint();
        if finalized.root == H256::zero() {
            // At genesis the state carries a zeroed checkpoint root; the
            // anchor block is what everything must build on.
            finalized.root = anchor.block_root();
        }

        Self {
            inner: Mutex::new(Inner {
                hot: HotChain::new(anchor),
                cold: ColdChain::new(state_db),
                finalized,
                sink,
            }),
            genesis,
        }
    }

    pub fn genesis(&self) -> GenesisInfo {
        self.genesis
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.lock().finalized
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<C>> {
        self.inner.lock().expect("chain store poisoned")
    }

    /// Inserts a freshly computed entry. The caller ran the state transition
    /// off the lock on an immutable predecessor state.
    pub fn insert(&self, entry: ChainEntry<C>) -> Result<(), Error> {
        self.lock().hot.insert(entry)
    }

    /// Fork choice picks the head; the store only records it.
    pub fn set_head(&self, block_root: H256) -> Result<(), Error> {
        self.lock().hot.set_head(block_root)
    }

    pub fn head(&self) -> ChainEntry<C> {
        self.lock().hot.head_entry()
    }

    /// Migrates entries below the newly finalised checkpoint from hot to
    /// cold, invoking the sink for every migrated or pruned entry. Finality
    /// never rewinds: stale checkpoints are ignored.
    pub fn on_finalized(&self, checkpoint: Checkpoint) -> Result<(), Error> {
        let mut inner = self.lock();
        if checkpoint.epoch <= inner.finalized.epoch {
            return Ok(());
        }

        info!(
            "finalizing {:?} at epoch {}",
            checkpoint.root, checkpoint.epoch
        );
        let (migrated, pruned) = inner.hot.finalize(checkpoint.root)?;
        for entry in &migrated {
            inner.sink.on_migrated_entry(entry, true);
            inner.cold.on_finalized_entry(entry)?;
        }
        for entry in &pruned {
            inner.sink.on_migrated_entry(entry, false);
        }
        inner.finalized = checkpoint;
        Ok(())
    }

    /// Computes the post-state of a block on a working copy, off the lock,
    /// and inserts the resulting entry. Any validation failure discards the
    /// copy, so the store never observes a half-applied block.
    pub fn extend(
        &self,
        signed_block: &SignedBeaconBlock<C>,
        schedule: &ForkSchedule,
        engine: &dyn ExecutionEngine<C>,
        verify_signatures: bool,
        cancellation: &Cancellation,
    ) -> Result<ChainEntry<C>> {
        let parent = self
            .by_block(signed_block.parent_root())
            .ok_or(Error::UnknownBlock(signed_block.parent_root()))?;
        ensure!(
            parent.step().slot() < signed_block.slot(),
            "block at slot {} does not come after its parent at {}",
            signed_block.slot(),
            parent.step(),
        );

        let mut state = (*parent.state()).clone();
        state_transition(
            &mut state,
            signed_block,
            schedule,
            engine,
            verify_signatures,
            true,
            cancellation,
        )?;

        let epoch_context = Arc::new(EpochContext::for_state(&state)?);
        let entry = ChainEntry::new(
            Step::new(signed_block.slot(), true),
            signed_block.message_root(),
            signed_block.parent_root(),
            Arc::new(state),
            epoch_context,
        );
        self.insert(entry.clone())?;
        Ok(entry)
    }

    pub fn by_state_root(&self, state_root: H256) -> Option<ChainEntry<C>> {
        let inner = self.lock();
        inner
            .hot
            .by_state_root(state_root)
            .or_else(|| inner.cold.by_state_root(state_root))
    }

    pub fn by_block(&self, block_root: H256) -> Option<ChainEntry<C>> {
        let inner = self.lock();
        inner
            .hot
            .by_block(block_root)
            .or_else(|| inner.cold.by_block(block_root))
    }

    pub fn by_block_slot(&self, block_root: H256, slot: Slot) -> Option<ChainEntry<C>> {
        let inner = self.lock();
        inner
            .hot
            .by_block_slot(block_root, slot)
            .or_else(|| inner.cold.by_block_slot(block_root, slot))
    }

    pub fn closest(&self, from_block_root: H256, to_slot: Slot) -> Option<ChainEntry<C>> {
        let inner = self.lock();
        inner
            .hot
            .closest(from_block_root, to_slot)
            .or_else(|| inner.cold.closest(from_block_root, to_slot))
    }

    /// Whether `root` builds on `anchor`. Follows hot-to-cold so data moving
    /// between tiers during the check is not lost.
    pub fn in_subtree(&self, anchor: H256, root: H256) -> (bool, bool) {
        let inner = self.lock();

        let (unknown, in_subtree) = inner.hot.in_subtree(anchor, root);
        if !unknown {
            return (false, in_subtree);
        }

        let hot_anchor = inner.hot.anchor_root();
        let (unknown, in_subtree) = inner.hot.in_subtree(hot_anchor, root);
        if !unknown {
            if !in_subtree {
                return (false, false);
            }
            // The root hangs off the hot tier; the anchor must then be part
            // of the finalised history.
            let known_cold = inner.cold.by_block(anchor).is_some();
            return (!known_cold, known_cold);
        }

        inner.cold.in_subtree(anchor, root)
    }

    pub fn search(
        &self,
        parent_root: Option<H256>,
        slot: Option<Slot>,
    ) -> Vec<SearchEntry<C>> {
        let inner = self.lock();
        if parent_root.is_none() && slot.is_none() {
            return inner.hot.search(None, None);
        }

        let mut results = inner.cold.search(parent_root, slot);
        results.extend(inner.hot.search(parent_root, slot));
        results
    }

    pub fn by_canon_step(&self, step: Step) -> Option<ChainEntry<C>> {
        let inner = self.lock();
        inner
            .hot
            .by_canon_step(step)
            .or_else(|| inner.cold.by_canon_step(step))
    }

    /// The canonical chain from the cold tail to the hot head, in step
    /// order.
    pub fn canonical_entries(&self) -> Vec<ChainEntry<C>> {
        let inner = self.lock();
        let mut entries = inner.cold.canonical_entries();
        entries.extend(inner.hot.canonical_entries());
        entries
    }
}
