use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ethereum_types::H256;
use log::debug;

use epoch_context::EpochContext;
use types::config::Config;
use types::primitives::Slot;

use crate::entry::{ChainEntry, SearchEntry};
use crate::error::Error;
use crate::state_db::StateDb;
use crate::step::Step;

struct ColdEntry {
    block_root: H256,
    parent_root: H256,
    state_root: H256,
}

/// The finalised linear chain, indexed by `Step`. Appended to as the hot
/// tier migrates entries; states live in the state database and are
/// rehydrated on demand.
pub struct ColdChain<C: Config> {
    entries: BTreeMap<Step, ColdEntry>,
    by_block: HashMap<H256, Step>,
    by_state_root: HashMap<H256, Step>,
    db: Arc<dyn StateDb<C>>,
}

impl<C: Config> ColdChain<C> {
    pub fn new(db: Arc<dyn StateDb<C>>) -> Self {
        Self {
            entries: BTreeMap::new(),
            by_block: HashMap::new(),
            by_state_root: HashMap::new(),
            db,
        }
    }

    pub fn start(&self) -> Option<Step> {
        self.entries.keys().next().copied()
    }

    pub fn end(&self) -> Option<Step> {
        self.entries.keys().next_back().copied()
    }

    /// Appends a newly finalised entry. The cold chain never rewrites:
    /// regressing steps are a caller bug.
    pub fn on_finalized_entry(&mut self, entry: &ChainEntry<C>) -> Result<(), Error> {
        if let Some(end) = self.end() {
            if entry.step() <= end {
                return Err(Error::FinalityRegression {
                    end,
                    appended: entry.step(),
                });
            }
        }

        debug!("entry {} moved to the cold chain", entry.step());
        self.db.store(&entry.state());
        if entry.step().block() {
            self.by_block.insert(entry.block_root(), entry.step());
        }
        self.by_state_root.insert(entry.state_root(), entry.step());
        self.entries.insert(
            entry.step(),
            ColdEntry {
                block_root: entry.block_root(),
                parent_root: entry.parent_root(),
                state_root: entry.state_root(),
            },
        );
        Ok(())
    }

    fn rehydrate(&self, step: Step) -> Option<ChainEntry<C>> {
        let cold = self.entries.get(&step)?;
        let state = self.db.get(cold.state_root)?;
        let epoch_context = EpochContext::for_state(&state).ok()?;
        Some(ChainEntry::new(
            step,
            cold.block_root,
            cold.parent_root,
            Arc::new(state),
            Arc::new(epoch_context),
        ))
    }

    pub fn by_state_root(&self, state_root: H256) -> Option<ChainEntry<C>> {
        self.rehydrate(*self.by_state_root.get(&state_root)?)
    }

    pub fn by_block(&self, block_root: H256) -> Option<ChainEntry<C>> {
        self.rehydrate(*self.by_block.get(&block_root)?)
    }

    pub fn by_block_slot(&self, block_root: H256, slot: Slot) -> Option<ChainEntry<C>> {
        let block_step = Step::new(slot, true);
        let slot_step = Step::new(slot, false);
        for step in [block_step, slot_step].iter() {
            if let Some(cold) = self.entries.get(step) {
                if cold.block_root == block_root {
                    return self.rehydrate(*step);
                }
            }
        }
        None
    }

    /// In a linear chain the closest entry is simply the last one at or
    /// before the slot, provided `from_block_root` is known.
    pub fn closest(&self, from_block_root: H256, to_slot: Slot) -> Option<ChainEntry<C>> {
        let from_step = *self.by_block.get(&from_block_root)?;
        let bound = Step::new(to_slot, true).min(from_step);
        let (step, _) = self.entries.range(..=bound).next_back()?;
        self.rehydrate(*step)
    }

    /// Ancestry in the finalised chain is just step ordering.
    pub fn in_subtree(&self, anchor: H256, root: H256) -> (bool, bool) {
        let root_step = match self.by_block.get(&root) {
            Some(step) => *step,
            None => return (true, false),
        };
        match self.by_block.get(&anchor) {
            Some(anchor_step) => (false, *anchor_step <= root_step),
            None => (false, false),
        }
    }

    pub fn search(&self, parent_root: Option<H256>, slot: Option<Slot>) -> Vec<SearchEntry<C>> {
        if parent_root.is_none() && slot.is_none() {
            return vec![];
        }

        self.entries
            .iter()
            .filter(|(step, cold)| {
                if !step.block() {
                    return false;
                }
                let parent_matches = parent_root
                    .map(|parent| cold.parent_root == parent)
                    .unwrap_or(true);
                let slot_matches = slot.map(|slot| step.slot() == slot).unwrap_or(true);
                parent_matches && slot_matches
            })
            .filter_map(|(step, _)| self.rehydrate(*step))
            .map(|entry| SearchEntry {
                entry,
                canonical: true,
            })
            .collect()
    }

    pub fn by_canon_step(&self, step: Step) -> Option<ChainEntry<C>> {
        self.rehydrate(step)
    }

    pub fn canonical_entries(&self) -> Vec<ChainEntry<C>> {
        self.entries
            .keys()
            .filter_map(|step| self.rehydrate(*step))
            .collect()
    }

    /// Drops history from the tail up to (excluding) the given step. The
    /// remaining chain is never rewritten.
    pub fn prune_tail(&mut self, up_to: Step) {
        let keep = self.entries.split_off(&up_to);
        let dropped = std::mem::replace(&mut self.entries, keep);
        for (step, cold) in dropped {
            self.db.remove(cold.state_root);
            self.by_state_root.remove(&cold.state_root);
            if step.block() {
                self.by_block.remove(&cold.block_root);
            }
        }
    }
}
