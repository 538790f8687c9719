use std::collections::{BTreeMap, HashMap, HashSet};

use ethereum_types::H256;
use log::info;

use types::config::Config;
use types::primitives::Slot;

use crate::entry::{ChainEntry, SearchEntry};
use crate::error::Error;
use crate::step::Step;

/// The unfinalised block DAG, rooted at the latest finalised entry. Sibling
/// branches coexist; one of them, chosen by the fork-choice consumer through
/// `set_head`, is marked canonical.
pub struct HotChain<C: Config> {
    /// Every unfinalised entry, keyed by `(block_root, step)`. Empty-slot
    /// snapshots carry the root of the last block.
    entries: BTreeMap<(H256, Step), ChainEntry<C>>,
    by_state_root: HashMap<H256, (H256, Step)>,
    /// Step at which each known block was incorporated.
    blocks: HashMap<H256, Step>,
    parents: HashMap<H256, H256>,
    children: HashMap<H256, Vec<H256>>,
    anchor: H256,
    head: H256,
    canonical_roots: HashSet<H256>,
    canon_steps: BTreeMap<Step, (H256, Step)>,
}

impl<C: Config> HotChain<C> {
    pub fn new(anchor: ChainEntry<C>) -> Self {
        let anchor_root = anchor.block_root();
        let step = anchor.step();

        let mut chain = Self {
            entries: BTreeMap::new(),
            by_state_root: HashMap::new(),
            blocks: HashMap::new(),
            parents: HashMap::new(),
            children: HashMap::new(),
            anchor: anchor_root,
            head: anchor_root,
            canonical_roots: HashSet::new(),
            canon_steps: BTreeMap::new(),
        };

        chain.blocks.insert(anchor_root, step);
        chain
            .by_state_root
            .insert(anchor.state_root(), (anchor_root, step));
        chain.entries.insert((anchor_root, step), anchor);
        chain.rebuild_canonical();
        chain
    }

    pub fn anchor_root(&self) -> H256 {
        self.anchor
    }

    pub fn head_root(&self) -> H256 {
        self.head
    }

    pub fn head_entry(&self) -> ChainEntry<C> {
        self.entries[&(self.head, self.blocks[&self.head])].clone()
    }

    pub fn is_canonical(&self, block_root: H256) -> bool {
        self.canonical_roots.contains(&block_root)
    }

    /// Inserts an entry whose ancestry is already known. A duplicate block
    /// at an already-occupied `(root, step)` is ignored: only the first
    /// proposal is incorporated.
    pub fn insert(&mut self, entry: ChainEntry<C>) -> Result<(), Error> {
        let key = (entry.block_root(), entry.step());
        if self.entries.contains_key(&key) {
            return Ok(());
        }

        if entry.step().block() {
            if !self.blocks.contains_key(&entry.parent_root()) {
                return Err(Error::UnknownAncestor(entry.parent_root()));
            }
            if let Some(existing) = self.blocks.get(&entry.block_root()) {
                // A block root is incorporated exactly once.
                if *existing != entry.step() {
                    return Ok(());
                }
            }
            self.blocks.insert(entry.block_root(), entry.step());
            self.parents.insert(entry.block_root(), entry.parent_root());
            self.children
                .entry(entry.parent_root())
                .or_default()
                .push(entry.block_root());
        } else if !self.blocks.contains_key(&entry.block_root()) {
            // An empty-slot snapshot extends a known block.
            return Err(Error::UnknownAncestor(entry.block_root()));
        }

        self.by_state_root.insert(entry.state_root(), key);
        self.entries.insert(key, entry);
        self.rebuild_canonical();
        Ok(())
    }

    /// Marks the branch ending at `block_root` canonical.
    pub fn set_head(&mut self, block_root: H256) -> Result<(), Error> {
        if !self.blocks.contains_key(&block_root) {
            return Err(Error::UnknownBlock(block_root));
        }
        self.head = block_root;
        self.rebuild_canonical();
        Ok(())
    }

    fn rebuild_canonical(&mut self) {
        self.canonical_roots.clear();
        let mut current = self.head;
        loop {
            self.canonical_roots.insert(current);
            match self.parents.get(&current) {
                Some(parent) => current = *parent,
                None => break,
            }
        }

        self.canon_steps = self
            .entries
            .keys()
            .filter(|(root, _)| self.canonical_roots.contains(root))
            .map(|(root, step)| (*step, (*root, *step)))
            .collect();
    }

    pub fn by_state_root(&self, state_root: H256) -> Option<ChainEntry<C>> {
        let key = self.by_state_root.get(&state_root)?;
        self.entries.get(key).cloned()
    }

    pub fn by_block(&self, block_root: H256) -> Option<ChainEntry<C>> {
        let step = self.blocks.get(&block_root)?;
        self.entries.get(&(block_root, *step)).cloned()
    }

    pub fn by_block_slot(&self, block_root: H256, slot: Slot) -> Option<ChainEntry<C>> {
        self.entries
            .get(&(block_root, Step::new(slot, true)))
            .or_else(|| self.entries.get(&(block_root, Step::new(slot, false))))
            .cloned()
    }

    /// The closest ancestor entry of `from_block_root` at a slot not past
    /// `to_slot`; possibly the entry of `from_block_root` itself.
    pub fn closest(&self, from_block_root: H256, to_slot: Slot) -> Option<ChainEntry<C>> {
        let mut current = from_block_root;
        loop {
            let step = self.blocks.get(&current)?;
            if step.slot() <= to_slot {
                break;
            }
            current = *self.parents.get(&current)?;
        }

        self.entries
            .range((current, Step::new(0, false))..=(current, Step::new(to_slot, true)))
            .next_back()
            .map(|(_, entry)| entry.clone())
    }

    /// Whether `root` builds (possibly indirectly) on `anchor`. A root equal
    /// to the anchor counts as inside the subtree. When either root is not
    /// part of this tier the question cannot be decided here: the anchor may
    /// live in the finalised history.
    pub fn in_subtree(&self, anchor: H256, root: H256) -> (bool, bool) {
        if !self.blocks.contains_key(&root) || !self.blocks.contains_key(&anchor) {
            return (true, false);
        }

        let mut current = root;
        loop {
            if current == anchor {
                return (false, true);
            }
            match self.parents.get(&current) {
                Some(parent) => current = *parent,
                None => return (false, false),
            }
        }
    }

    /// Blocks matching the given parent and/or slot; all branch heads when
    /// neither is given.
    pub fn search(&self, parent_root: Option<H256>, slot: Option<Slot>) -> Vec<SearchEntry<C>> {
        let heads_only = parent_root.is_none() && slot.is_none();

        self.blocks
            .iter()
            .filter(|(root, step)| {
                if heads_only {
                    return self
                        .children
                        .get(*root)
                        .map(|children| children.is_empty())
                        .unwrap_or(true);
                }
                let parent_matches = parent_root
                    .map(|parent| self.parents.get(*root) == Some(&parent))
                    .unwrap_or(true);
                let slot_matches = slot.map(|slot| step.slot() == slot).unwrap_or(true);
                parent_matches && slot_matches
            })
            .filter_map(|(root, step)| {
                self.entries.get(&(*root, *step)).map(|entry| SearchEntry {
                    entry: entry.clone(),
                    canonical: self.is_canonical(*root),
                })
            })
            .collect()
    }

    pub fn by_canon_step(&self, step: Step) -> Option<ChainEntry<C>> {
        let key = self.canon_steps.get(&step)?;
        self.entries.get(key).cloned()
    }

    pub fn canonical_entries(&self) -> Vec<ChainEntry<C>> {
        self.canon_steps
            .values()
            .filter_map(|key| self.entries.get(key).cloned())
            .collect()
    }

    /// Re-roots the hot DAG at the newly finalised block. Canonical entries
    /// below the new root are drained in chain order for migration to the
    /// cold tier; everything not in the new root's subtree is pruned.
    ///
    /// Returns `(migrated, pruned)`.
    pub fn finalize(
        &mut self,
        finalized_root: H256,
    ) -> Result<(Vec<ChainEntry<C>>, Vec<ChainEntry<C>>), Error> {
        if !self.blocks.contains_key(&finalized_root) {
            return Err(Error::UnknownBlock(finalized_root));
        }
        let (unknown, in_subtree) = self.in_subtree(self.anchor, finalized_root);
        if unknown || !in_subtree {
            return Err(Error::UnknownAncestor(finalized_root));
        }

        // Roots on the anchor→finalized path, the finalised root excluded:
        // those entries become cold.
        let mut migrating_roots = HashSet::new();
        let mut current = finalized_root;
        while current != self.anchor {
            current = self.parents[&current];
            migrating_roots.insert(current);
        }
        if finalized_root == self.anchor {
            return Ok((vec![], vec![]));
        }

        // Roots that stay hot: the subtree of the finalised block.
        let mut keep = HashSet::new();
        let mut stack = vec![finalized_root];
        while let Some(root) = stack.pop() {
            if keep.insert(root) {
                if let Some(children) = self.children.get(&root) {
                    stack.extend(children.iter().copied());
                }
            }
        }

        let finalized_step = self.blocks[&finalized_root];
        let mut migrated = vec![];
        let mut pruned = vec![];
        let mut retained = BTreeMap::new();
        for ((root, step), entry) in std::mem::take(&mut self.entries) {
            if keep.contains(&root) && step >= finalized_step {
                retained.insert((root, step), entry);
            } else if migrating_roots.contains(&root)
                || (root == finalized_root && step < finalized_step)
            {
                migrated.push(entry);
            } else {
                info!("pruning non-canonical entry {} at {}", root, step);
                pruned.push(entry);
            }
        }
        self.entries = retained;

        // Rebuild the indices over the retained subtree.
        self.blocks.retain(|root, _| keep.contains(root));
        self.parents
            .retain(|root, _| keep.contains(root) && *root != finalized_root);
        self.children.retain(|root, _| keep.contains(root));
        self.by_state_root = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.state_root(), *key))
            .collect();

        self.anchor = finalized_root;
        if !keep.contains(&self.head) {
            self.head = finalized_root;
        }
        self.rebuild_canonical();

        migrated.sort_by_key(ChainEntry::step);
        Ok((migrated, pruned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{entry_after, genesis_entry};
    use types::config::MinimalConfig;

    #[test]
    fn inserting_an_orphan_fails() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());

        let orphan = entry_after(&genesis, 1, H256::repeat_byte(0xbb), H256::repeat_byte(0xaa));
        assert!(matches!(
            chain.insert(orphan),
            Err(Error::UnknownAncestor(_))
        ));
    }

    #[test]
    fn lookup_by_every_key() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let block = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        chain.insert(block.clone()).expect("Test");

        assert!(chain.by_block(block.block_root()).is_some());
        assert!(chain.by_state_root(block.state_root()).is_some());
        assert!(chain.by_block_slot(block.block_root(), 1).is_some());
        assert!(chain.by_block_slot(block.block_root(), 2).is_none());
    }

    #[test]
    fn closest_walks_back_to_an_ancestor() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let a = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        let b = entry_after(&a, 5, H256::repeat_byte(2), a.block_root());
        chain.insert(a.clone()).expect("Test");
        chain.insert(b.clone()).expect("Test");

        let closest = chain.closest(b.block_root(), 3).expect("Test");
        assert_eq!(closest.block_root(), a.block_root());

        let this_one = chain.closest(b.block_root(), 5).expect("Test");
        assert_eq!(this_one.block_root(), b.block_root());
    }

    #[test]
    fn subtree_membership() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let a = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        let b = entry_after(&a, 2, H256::repeat_byte(2), a.block_root());
        let fork = entry_after(&genesis, 1, H256::repeat_byte(3), genesis.block_root());
        chain.insert(a.clone()).expect("Test");
        chain.insert(b.clone()).expect("Test");
        chain.insert(fork.clone()).expect("Test");

        assert_eq!(chain.in_subtree(a.block_root(), b.block_root()), (false, true));
        assert_eq!(
            chain.in_subtree(a.block_root(), fork.block_root()),
            (false, false)
        );
        assert_eq!(
            chain.in_subtree(a.block_root(), H256::repeat_byte(0xff)),
            (true, false)
        );
        // A root is in its own subtree.
        assert_eq!(chain.in_subtree(a.block_root(), a.block_root()), (false, true));
    }

    #[test]
    fn search_returns_heads_by_default() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let a = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        let fork = entry_after(&genesis, 2, H256::repeat_byte(2), genesis.block_root());
        chain.insert(a.clone()).expect("Test");
        chain.insert(fork.clone()).expect("Test");

        let heads = chain.search(None, None);
        assert_eq!(heads.len(), 2);

        let by_parent = chain.search(Some(genesis.block_root()), None);
        assert_eq!(by_parent.len(), 2);

        let by_slot = chain.search(None, Some(2));
        assert_eq!(by_slot.len(), 1);
        assert_eq!(by_slot[0].entry.block_root(), fork.block_root());
    }

    #[test]
    fn head_choice_marks_canonical() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let a = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        let fork = entry_after(&genesis, 1, H256::repeat_byte(2), genesis.block_root());
        chain.insert(a.clone()).expect("Test");
        chain.insert(fork.clone()).expect("Test");

        chain.set_head(a.block_root()).expect("Test");
        assert!(chain.is_canonical(a.block_root()));
        assert!(!chain.is_canonical(fork.block_root()));

        chain.set_head(fork.block_root()).expect("Test");
        assert!(!chain.is_canonical(a.block_root()));
        assert!(chain.is_canonical(fork.block_root()));
    }

    #[test]
    fn finalization_splits_canonical_from_pruned() {
        let genesis = genesis_entry::<MinimalConfig>(8);
        let mut chain = HotChain::new(genesis.clone());
        let a = entry_after(&genesis, 1, H256::repeat_byte(1), genesis.block_root());
        let b = entry_after(&a, 2, H256::repeat_byte(2), a.block_root());
        let fork = entry_after(&genesis, 1, H256::repeat_byte(3), genesis.block_root());
        chain.insert(a.clone()).expect("Test");
        chain.insert(b.clone()).expect("Test");
        chain.insert(fork.clone()).expect("Test");
        chain.set_head(b.block_root()).expect("Test");

        let (migrated, pruned) = chain.finalize(b.block_root()).expect("Test");

        let migrated_roots: Vec<H256> =
            migrated.iter().map(ChainEntry::block_root).collect();
        assert_eq!(migrated_roots, vec![genesis.block_root(), a.block_root()]);

        let pruned_roots: Vec<H256> = pruned.iter().map(ChainEntry::block_root).collect();
        assert_eq!(pruned_roots, vec![fork.block_root()]);

        assert_eq!(chain.anchor_root(), b.block_root());
        assert!(chain.by_block(genesis.block_root()).is_none());
        assert!(chain.by_block(b.block_root()).is_some());
    }
}
