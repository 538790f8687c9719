use std::collections::HashMap;
use std::sync::RwLock;

use ethereum_types::H256;
use log::debug;

use types::config::{Config, ForkName};
use types::BeaconState;

/// Storage of state snapshots keyed by their hash-tree-root. Values are the
/// SSZ image tagged with the fork that shaped it, since the wire form alone
/// does not identify the schema.
pub trait StateDb<C: Config>: Send + Sync {
    /// Returns whether a snapshot with this root already existed.
    fn store(&self, state: &BeaconState<C>) -> bool;

    fn get(&self, state_root: H256) -> Option<BeaconState<C>>;

    fn remove(&self, state_root: H256) -> bool;

    fn list(&self) -> Vec<H256>;
}

#[derive(Default)]
pub struct MemStateDb {
    data: RwLock<HashMap<H256, (ForkName, Vec<u8>)>>,
}

impl MemStateDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().expect("state db poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Config> StateDb<C> for MemStateDb {
    fn store(&self, state: &BeaconState<C>) -> bool {
        let root = state.tree_hash_root();
        let mut data = self.data.write().expect("state db poisoned");
        let existed = data
            .insert(root, (state.fork_name(), state.as_ssz_bytes()))
            .is_some();
        if !existed {
            debug!("stored state {:?}", root);
        }
        existed
    }

    fn get(&self, state_root: H256) -> Option<BeaconState<C>> {
        let data = self.data.read().expect("state db poisoned");
        let (fork, bytes) = data.get(&state_root)?;
        match BeaconState::from_ssz_bytes(bytes, *fork) {
            Ok(state) => Some(state),
            Err(_) => panic!("state db corrupted at {:?}", state_root),
        }
    }

    fn remove(&self, state_root: H256) -> bool {
        self.data
            .write()
            .expect("state db poisoned")
            .remove(&state_root)
            .is_some()
    }

    fn list(&self) -> Vec<H256> {
        self.data
            .read()
            .expect("state db poisoned")
            .keys()
            .copied()
            .collect()
    }
}
