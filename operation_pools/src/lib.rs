//! De-duplicated holding areas for operations awaiting block inclusion.
//! Pools only collect; spam protection and reward-aware packing policy
//! belong to the caller. Each pool tolerates concurrent readers alongside
//! writers through a reader–writer lock.

use std::collections::HashMap;
use std::sync::RwLock;

use ethereum_types::H256;

use helper_functions::crypto::hash_tree_root;
use types::config::Config;
use types::primitives::{ValidatorIndex, Version};
use types::types::{Attestation, AttesterSlashing, ProposerSlashing, SignedVoluntaryExit};

/// Keyed by proposer: two conflicting proposals are one slashing, and a
/// proposer can only be slashed once.
#[derive(Default)]
pub struct ProposerSlashingPool {
    slashings: RwLock<HashMap<ValidatorIndex, ProposerSlashing>>,
}

impl ProposerSlashingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a slashing for this proposer was already held.
    pub fn insert(&self, slashing: ProposerSlashing) -> bool {
        let key = slashing.signed_header_1.message.proposer_index;
        let mut slashings = self.slashings.write().expect("pool poisoned");
        if slashings.contains_key(&key) {
            return true;
        }
        slashings.insert(key, slashing);
        false
    }

    pub fn all(&self) -> Vec<ProposerSlashing> {
        self.slashings
            .read()
            .expect("pool poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Removes and returns up to `count` slashings for block inclusion.
    pub fn pack(&self, count: usize) -> Vec<ProposerSlashing> {
        let mut slashings = self.slashings.write().expect("pool poisoned");
        let keys: Vec<ValidatorIndex> = slashings.keys().take(count).copied().collect();
        keys.into_iter()
            .filter_map(|key| slashings.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slashings.read().expect("pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed by `(root, fork version)`: the same pair of attestations signs
/// differently across forks, so both forms may need to be held.
pub struct AttesterSlashingPool<C: Config> {
    slashings: RwLock<HashMap<(H256, Version), AttesterSlashing<C>>>,
}

impl<C: Config> Default for AttesterSlashingPool<C> {
    fn default() -> Self {
        Self {
            slashings: RwLock::new(HashMap::new()),
        }
    }
}

impl<C: Config> AttesterSlashingPool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// This does not filter slashings that are a subset of other slashings.
    pub fn insert(&self, slashing: AttesterSlashing<C>, version: Version) -> bool {
        let key = (hash_tree_root(&slashing), version);
        let mut slashings = self.slashings.write().expect("pool poisoned");
        if slashings.contains_key(&key) {
            return true;
        }
        slashings.insert(key, slashing);
        false
    }

    pub fn all(&self) -> Vec<AttesterSlashing<C>> {
        self.slashings
            .read()
            .expect("pool poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn pack(&self, count: usize) -> Vec<AttesterSlashing<C>> {
        let mut slashings = self.slashings.write().expect("pool poisoned");
        let keys: Vec<(H256, Version)> = slashings.keys().take(count).copied().collect();
        keys.into_iter()
            .filter_map(|key| slashings.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slashings.read().expect("pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed by exiting validator; an exit supersedes nothing and is only
/// collected once.
#[derive(Default)]
pub struct VoluntaryExitPool {
    exits: RwLock<HashMap<ValidatorIndex, SignedVoluntaryExit>>,
}

impl VoluntaryExitPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, exit: SignedVoluntaryExit) -> bool {
        let key = exit.message.validator_index;
        let mut exits = self.exits.write().expect("pool poisoned");
        if exits.contains_key(&key) {
            return true;
        }
        exits.insert(key, exit);
        false
    }

    pub fn all(&self) -> Vec<SignedVoluntaryExit> {
        self.exits
            .read()
            .expect("pool poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn pack(&self, count: usize) -> Vec<SignedVoluntaryExit> {
        let mut exits = self.exits.write().expect("pool poisoned");
        let keys: Vec<ValidatorIndex> = exits.keys().take(count).copied().collect();
        keys.into_iter()
            .filter_map(|key| exits.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.exits.read().expect("pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Attestations grouped by their data root and de-duplicated by full root.
/// Aggregation of signatures is the oracle's business, so equal-data
/// attestations with different bit patterns are held side by side.
pub struct AttestationPool<C: Config> {
    attestations: RwLock<HashMap<H256, Vec<Attestation<C>>>>,
}

impl<C: Config> Default for AttestationPool<C> {
    fn default() -> Self {
        Self {
            attestations: RwLock::new(HashMap::new()),
        }
    }
}

impl<C: Config> AttestationPool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, attestation: Attestation<C>) -> bool {
        let data_root = hash_tree_root(&attestation.data);
        let mut attestations = self.attestations.write().expect("pool poisoned");
        let group = attestations.entry(data_root).or_default();
        if group.iter().any(|held| held == &attestation) {
            return true;
        }
        group.push(attestation);
        false
    }

    pub fn all(&self) -> Vec<Attestation<C>> {
        self.attestations
            .read()
            .expect("pool poisoned")
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn pack(&self, count: usize) -> Vec<Attestation<C>> {
        let mut attestations = self.attestations.write().expect("pool poisoned");
        let mut packed = vec![];
        let mut emptied = vec![];
        for (data_root, group) in attestations.iter_mut() {
            while packed.len() < count {
                match group.pop() {
                    Some(attestation) => packed.push(attestation),
                    None => break,
                }
            }
            if group.is_empty() {
                emptied.push(*data_root);
            }
            if packed.len() == count {
                break;
            }
        }
        for data_root in emptied {
            attestations.remove(&data_root);
        }
        packed
    }

    pub fn len(&self) -> usize {
        self.attestations
            .read()
            .expect("pool poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::{BitList, VariableList};
    use types::config::MinimalConfig;
    use types::primitives::SignatureBytes;
    use types::types::{
        AttestationData, BeaconBlockHeader, IndexedAttestation, SignedBeaconBlockHeader,
        VoluntaryExit,
    };

    fn proposer_slashing(proposer_index: u64, graffiti: u8) -> ProposerSlashing {
        let header = |state_root: u8| SignedBeaconBlockHeader {
            message: BeaconBlockHeader {
                proposer_index,
                state_root: H256::repeat_byte(state_root),
                ..BeaconBlockHeader::default()
            },
            signature: SignatureBytes::empty(),
        };
        ProposerSlashing {
            signed_header_1: header(graffiti),
            signed_header_2: header(graffiti + 1),
        }
    }

    #[test]
    fn proposer_pool_dedups_by_proposer() {
        let pool = ProposerSlashingPool::new();
        assert!(!pool.insert(proposer_slashing(1, 1)));
        // A different slashing for the same proposer is redundant.
        assert!(pool.insert(proposer_slashing(1, 9)));
        assert!(!pool.insert(proposer_slashing(2, 1)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn proposer_pool_pack_drains() {
        let pool = ProposerSlashingPool::new();
        pool.insert(proposer_slashing(1, 1));
        pool.insert(proposer_slashing(2, 1));
        pool.insert(proposer_slashing(3, 1));

        let packed = pool.pack(2);
        assert_eq!(packed.len(), 2);
        assert_eq!(pool.len(), 1);
    }

    fn attester_slashing(indices: Vec<u64>) -> AttesterSlashing<MinimalConfig> {
        AttesterSlashing {
            attestation_1: IndexedAttestation {
                attesting_indices: VariableList::from(indices.clone()),
                ..IndexedAttestation::default()
            },
            attestation_2: IndexedAttestation {
                attesting_indices: VariableList::from(indices),
                ..IndexedAttestation::default()
            },
        }
    }

    #[test]
    fn attester_pool_keys_include_fork_version() {
        let pool: AttesterSlashingPool<MinimalConfig> = AttesterSlashingPool::new();
        let v1 = Version::from([0, 0, 0, 1]);
        let v2 = Version::from([1, 0, 0, 1]);

        assert!(!pool.insert(attester_slashing(vec![1, 2]), v1));
        assert!(pool.insert(attester_slashing(vec![1, 2]), v1));
        // The same message under another fork version is a distinct entry.
        assert!(!pool.insert(attester_slashing(vec![1, 2]), v2));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn exit_pool_dedups_by_validator() {
        let pool = VoluntaryExitPool::new();
        let exit = |validator_index| SignedVoluntaryExit {
            message: VoluntaryExit {
                epoch: 0,
                validator_index,
            },
            signature: SignatureBytes::empty(),
        };

        assert!(!pool.insert(exit(5)));
        assert!(pool.insert(exit(5)));
        assert!(!pool.insert(exit(6)));
        assert_eq!(pool.all().len(), 2);
    }

    fn attestation(slot: u64, bits: usize) -> Attestation<MinimalConfig> {
        let mut aggregation_bits = BitList::with_capacity(4).expect("Test");
        for i in 0..bits {
            aggregation_bits.set(i, true).expect("Test");
        }
        Attestation {
            aggregation_bits,
            data: AttestationData {
                slot,
                ..AttestationData::default()
            },
            signature: SignatureBytes::empty(),
        }
    }

    #[test]
    fn attestation_pool_dedups_exact_duplicates_only() {
        let pool: AttestationPool<MinimalConfig> = AttestationPool::new();

        assert!(!pool.insert(attestation(1, 1)));
        assert!(pool.insert(attestation(1, 1)));
        // Same data, different participants: both are held.
        assert!(!pool.insert(attestation(1, 2)));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn attestation_pool_pack_respects_count() {
        let pool: AttestationPool<MinimalConfig> = AttestationPool::new();
        for slot in 0..4 {
            pool.insert(attestation(slot, 1));
        }

        let packed = pool.pack(3);
        assert_eq!(packed.len(), 3);
        assert_eq!(pool.len(), 1);
    }
}
