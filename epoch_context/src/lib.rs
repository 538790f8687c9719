//! Derived per-epoch data: shufflings, committee partitions, proposers, the
//! pubkey→index map and the total active stake. Rebuilt at epoch boundaries,
//! on fork transitions, and whenever the active validator set changes; shared
//! immutably between threads afterwards.

use std::collections::HashMap;

use ethereum_types::H256;
use thiserror::Error;
use typenum::Unsigned;

use helper_functions::beacon_state_accessors::{
    get_active_validator_indices, get_current_epoch, get_seed, get_total_balance,
};
use helper_functions::crypto::hash;
use helper_functions::math::int_to_bytes;
use helper_functions::misc::{
    compute_epoch_at_slot, compute_proposer_index, compute_shuffled_index,
};
use types::config::Config;
use types::primitives::*;
use types::BeaconState;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("slot {slot} is not in the epoch covered by this context")]
    SlotOutOfContext { slot: Slot },
    #[error("epoch {epoch} is not covered by this context")]
    EpochOutOfContext { epoch: Epoch },
    #[error("committee index {index} is out of range ({committees_per_slot} per slot)")]
    CommitteeIndexOutOfRange {
        index: CommitteeIndex,
        committees_per_slot: u64,
    },
    #[error("no active validators at the requested epoch")]
    NoActiveValidators,
    #[error(transparent)]
    Helper(#[from] helper_functions::Error),
}

/// The shuffled active-validator ordering of one epoch, with its committee
/// partition parameters.
#[derive(Clone, Debug)]
pub struct Shuffling {
    pub epoch: Epoch,
    /// Active validators in shuffled order.
    pub shuffled: Vec<ValidatorIndex>,
    pub committees_per_slot: u64,
}

impl Shuffling {
    fn compute<C: Config>(state: &BeaconState<C>, epoch: Epoch) -> Result<Self, Error> {
        let indices = get_active_validator_indices(state, epoch);
        let seed = get_seed(state, epoch, C::domain_beacon_attester())?;

        let total = indices.len() as u64;
        let mut shuffled = Vec::with_capacity(indices.len());
        for position in 0..total {
            let source = compute_shuffled_index::<C>(position, total, seed)?;
            shuffled.push(indices[source as usize]);
        }

        let committees_per_slot = (total / C::SlotsPerEpoch::to_u64()
            / C::target_committee_size())
        .min(C::max_committees_per_slot())
        .max(1);

        Ok(Self {
            epoch,
            shuffled,
            committees_per_slot,
        })
    }

    /// Committee members for `(slot, index)` as a slice of the shuffled set.
    fn committee<C: Config>(
        &self,
        slot: Slot,
        index: CommitteeIndex,
    ) -> Result<&[ValidatorIndex], Error> {
        if index >= self.committees_per_slot {
            return Err(Error::CommitteeIndexOutOfRange {
                index,
                committees_per_slot: self.committees_per_slot,
            });
        }

        let slots_per_epoch = C::SlotsPerEpoch::to_u64();
        let global_index = (slot % slots_per_epoch) * self.committees_per_slot + index;
        let count = self.committees_per_slot * slots_per_epoch;

        let total = self.shuffled.len() as u64;
        let start = (total * global_index / count) as usize;
        let end = (total * (global_index + 1) / count) as usize;
        Ok(&self.shuffled[start..end])
    }
}

pub struct EpochContext<C: Config> {
    pub previous: Shuffling,
    pub current: Shuffling,
    pub next: Shuffling,
    /// Proposer for every slot of the current epoch.
    proposers: Vec<ValidatorIndex>,
    pubkey_to_index: HashMap<PublicKeyBytes, ValidatorIndex>,
    pub total_active_balance: Gwei,
    _phantom: core::marker::PhantomData<C>,
}

impl<C: Config> EpochContext<C> {
    pub fn for_state(state: &BeaconState<C>) -> Result<Self, Error> {
        let current_epoch = get_current_epoch(state);
        let previous_epoch = current_epoch.saturating_sub(1);

        let previous = Shuffling::compute(state, previous_epoch)?;
        let current = Shuffling::compute(state, current_epoch)?;
        let next = Shuffling::compute(state, current_epoch + 1)?;

        if current.shuffled.is_empty() {
            return Err(Error::NoActiveValidators);
        }

        let proposers = Self::compute_proposers(state, current_epoch)?;

        let mut pubkey_to_index = HashMap::with_capacity(state.validators().len());
        for (index, validator) in state.validators().iter().enumerate() {
            pubkey_to_index.insert(validator.pubkey, index as u64);
        }

        let active = get_active_validator_indices(state, current_epoch);
        let total_active_balance = get_total_balance(state, active)?;

        Ok(Self {
            previous,
            current,
            next,
            proposers,
            pubkey_to_index,
            total_active_balance,
            _phantom: core::marker::PhantomData,
        })
    }

    fn compute_proposers(
        state: &BeaconState<C>,
        epoch: Epoch,
    ) -> Result<Vec<ValidatorIndex>, Error> {
        let indices = get_active_validator_indices(state, epoch);
        if indices.is_empty() {
            return Err(Error::NoActiveValidators);
        }

        let epoch_seed = get_seed(state, epoch, C::domain_beacon_proposer())?;
        let start_slot = epoch * C::SlotsPerEpoch::to_u64();

        let mut proposers = Vec::with_capacity(C::SlotsPerEpoch::to_usize());
        for slot in start_slot..start_slot + C::SlotsPerEpoch::to_u64() {
            let mut preimage = epoch_seed.as_bytes().to_vec();
            preimage.append(&mut int_to_bytes(slot, 8));
            let seed = H256::from_slice(&hash(&preimage));

            let proposer = compute_proposer_index::<C>(
                |index| state.validators()[index as usize].effective_balance,
                &indices,
                seed,
            )?;
            proposers.push(proposer);
        }

        Ok(proposers)
    }

    pub fn current_epoch(&self) -> Epoch {
        self.current.epoch
    }

    pub fn previous_epoch(&self) -> Epoch {
        self.previous.epoch
    }

    fn shuffling_at(&self, epoch: Epoch) -> Result<&Shuffling, Error> {
        if epoch == self.current.epoch {
            Ok(&self.current)
        } else if epoch == self.previous.epoch {
            Ok(&self.previous)
        } else if epoch == self.next.epoch {
            Ok(&self.next)
        } else {
            Err(Error::EpochOutOfContext { epoch })
        }
    }

    pub fn committee_count_per_slot(&self, epoch: Epoch) -> Result<u64, Error> {
        Ok(self.shuffling_at(epoch)?.committees_per_slot)
    }

    pub fn beacon_committee(
        &self,
        slot: Slot,
        index: CommitteeIndex,
    ) -> Result<&[ValidatorIndex], Error> {
        let epoch = compute_epoch_at_slot::<C>(slot);
        self.shuffling_at(epoch)?.committee::<C>(slot, index)
    }

    pub fn proposer_for(&self, slot: Slot) -> Result<ValidatorIndex, Error> {
        let start_slot = self.current.epoch * C::SlotsPerEpoch::to_u64();
        if !(start_slot..start_slot + C::SlotsPerEpoch::to_u64()).contains(&slot) {
            return Err(Error::SlotOutOfContext { slot });
        }
        Ok(self.proposers[(slot - start_slot) as usize])
    }

    pub fn pubkey_to_index(&self, pubkey: &PublicKeyBytes) -> Option<ValidatorIndex> {
        self.pubkey_to_index.get(pubkey).copied()
    }

    /// Registers a freshly appended validator without a full rebuild. The
    /// map is append-only, which is what makes concurrent readers safe.
    pub fn note_appended_validator(&mut self, pubkey: PublicKeyBytes, index: ValidatorIndex) {
        self.pubkey_to_index.entry(pubkey).or_insert(index);
    }
}
