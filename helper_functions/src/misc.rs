use ethereum_types::H256;
use ssz::TreeHash;
use typenum::Unsigned;

use types::config::Config;
use types::primitives::*;
use types::types::{ForkData, SigningData};

use crate::crypto::hash;
use crate::error::Error;
use crate::math::{bytes_to_int, int_to_bytes};

pub fn compute_epoch_at_slot<C: Config>(slot: Slot) -> Epoch {
    slot / C::SlotsPerEpoch::to_u64()
}

pub fn compute_start_slot_at_epoch<C: Config>(epoch: Epoch) -> Slot {
    epoch * C::SlotsPerEpoch::to_u64()
}

pub fn compute_activation_exit_epoch<C: Config>(epoch: Epoch) -> Epoch {
    epoch + 1 + C::max_seed_lookahead()
}

pub fn compute_time_at_slot<C: Config>(genesis_time: UnixSeconds, slot: Slot) -> UnixSeconds {
    genesis_time + slot * C::seconds_per_slot()
}

/// The swap-or-not shuffle applied to a single index.
pub fn compute_shuffled_index<C: Config>(
    mut index: ValidatorIndex,
    index_count: u64,
    seed: H256,
) -> Result<ValidatorIndex, Error> {
    if index >= index_count || index_count == 0 {
        return Err(Error::IndexOutOfRange);
    }

    for current_round in 0..C::shuffle_round_count() {
        let pivot = pivot(seed, current_round) % index_count;
        let flip = (pivot + index_count - index) % index_count;
        let position = index.max(flip);
        let source = hash_seed_round_position(seed, current_round, position / 256);
        let byte = source[((position % 256) / 8) as usize];
        let bit = (byte >> (position % 8)) % 2;
        index = if bit == 0 { index } else { flip };
    }

    Ok(index)
}

fn pivot(seed: H256, current_round: u8) -> u64 {
    let mut preimage = seed.as_bytes().to_vec();
    preimage.push(current_round);
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&hash(&preimage)[..8]);
    bytes_to_int(bytes)
}

fn hash_seed_round_position(seed: H256, current_round: u8, position_window: u64) -> Vec<u8> {
    let mut preimage = seed.as_bytes().to_vec();
    preimage.push(current_round);
    preimage.append(&mut int_to_bytes(position_window, 4));
    hash(&preimage)
}

/// Members of the committee with the given global `index` out of `count`
/// committees, taken from the shuffled ordering of `indices`.
pub fn compute_committee<C: Config>(
    indices: &[ValidatorIndex],
    seed: H256,
    index: u64,
    count: u64,
) -> Result<Vec<ValidatorIndex>, Error> {
    if count == 0 || index >= count {
        return Err(Error::CommitteeIndexOutOfRange);
    }

    let total = indices.len() as u64;
    let start = (total * index / count) as usize;
    let end = (total * (index + 1) / count) as usize;

    let mut committee = Vec::with_capacity(end - start);
    for i in start..end {
        let shuffled = compute_shuffled_index::<C>(i as u64, total, seed)?;
        committee.push(indices[shuffled as usize]);
    }

    Ok(committee)
}

/// Effective-balance-weighted proposer sampling. Candidates are drawn from
/// the shuffled ordering; a candidate is taken with probability proportional
/// to its effective balance.
pub fn compute_proposer_index<C: Config>(
    effective_balance: impl Fn(ValidatorIndex) -> Gwei,
    indices: &[ValidatorIndex],
    seed: H256,
) -> Result<ValidatorIndex, Error> {
    if indices.is_empty() {
        return Err(Error::NoActiveValidators);
    }

    const MAX_RANDOM_BYTE: u64 = u8::max_value() as u64;
    let total = indices.len() as u64;

    let mut i = 0_u64;
    loop {
        let shuffled = compute_shuffled_index::<C>(i % total, total, seed)?;
        let candidate = indices[shuffled as usize];

        let mut preimage = seed.as_bytes().to_vec();
        preimage.append(&mut int_to_bytes(i / 32, 8));
        let random_byte = u64::from(hash(&preimage)[(i % 32) as usize]);

        if effective_balance(candidate) * MAX_RANDOM_BYTE
            >= C::max_effective_balance() * random_byte
        {
            return Ok(candidate);
        }
        i += 1;
    }
}

pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: H256) -> H256 {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .tree_hash_root()
}

/// First four bytes of the fork data root; used to partition gossip topics.
pub fn compute_fork_digest(current_version: Version, genesis_validators_root: H256) -> [u8; 4] {
    let root = compute_fork_data_root(current_version, genesis_validators_root);
    let mut digest = [0; 4];
    digest.copy_from_slice(&root[..4]);
    digest
}

pub fn compute_domain(
    domain_type: DomainType,
    fork_version: Version,
    genesis_validators_root: H256,
) -> Domain {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0; 32];
    domain[..4].copy_from_slice(&domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    H256::from(domain)
}

pub fn compute_signing_root<T: TreeHash>(object: &T, domain: Domain) -> H256 {
    SigningData {
        object_root: object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}
