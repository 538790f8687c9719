use ethereum_types::H256;
use ssz::{BitVector, FixedVector, SszDecode, SszDecodeError, SszEncode, VariableList};

use crate::config::{Config, ForkName};
use crate::consts::{JustificationBitsLength, ParticipationFlags};
use crate::primitives::*;
use crate::types::{BeaconBlockHeader, Checkpoint, Eth1Data, Fork, Validator};
use crate::{altair, merge, phase0};

/// The beacon state at any supported fork. Fields shared by every fork are
/// reachable through accessors; fork-specific fields through the `as_*`
/// projections.
#[allow(clippy::large_enum_variant)]
#[derive(Clone, PartialEq, Debug)]
pub enum BeaconState<C: Config> {
    Phase0(phase0::BeaconState<C>),
    Altair(altair::BeaconState<C>),
    Merge(merge::BeaconState<C>),
}

macro_rules! scalar_accessor {
    ($name: ident, $name_mut: ident, $type: ty) => {
        pub fn $name(&self) -> $type {
            match self {
                Self::Phase0(state) => state.$name,
                Self::Altair(state) => state.$name,
                Self::Merge(state) => state.$name,
            }
        }

        pub fn $name_mut(&mut self) -> &mut $type {
            match self {
                Self::Phase0(state) => &mut state.$name,
                Self::Altair(state) => &mut state.$name,
                Self::Merge(state) => &mut state.$name,
            }
        }
    };
}

macro_rules! ref_accessor {
    ($name: ident, $name_mut: ident, $type: ty) => {
        pub fn $name(&self) -> &$type {
            match self {
                Self::Phase0(state) => &state.$name,
                Self::Altair(state) => &state.$name,
                Self::Merge(state) => &state.$name,
            }
        }

        pub fn $name_mut(&mut self) -> &mut $type {
            match self {
                Self::Phase0(state) => &mut state.$name,
                Self::Altair(state) => &mut state.$name,
                Self::Merge(state) => &mut state.$name,
            }
        }
    };
}

macro_rules! participation_accessor {
    ($name: ident, $name_mut: ident, $type: ty) => {
        pub fn $name(&self) -> Option<&$type> {
            match self {
                Self::Phase0(_) => None,
                Self::Altair(state) => Some(&state.$name),
                Self::Merge(state) => Some(&state.$name),
            }
        }

        pub fn $name_mut(&mut self) -> Option<&mut $type> {
            match self {
                Self::Phase0(_) => None,
                Self::Altair(state) => Some(&mut state.$name),
                Self::Merge(state) => Some(&mut state.$name),
            }
        }
    };
}

impl<C: Config> BeaconState<C> {
    scalar_accessor!(genesis_time, genesis_time_mut, UnixSeconds);
    scalar_accessor!(
        genesis_validators_root,
        genesis_validators_root_mut,
        H256
    );
    scalar_accessor!(slot, slot_mut, Slot);
    scalar_accessor!(eth1_deposit_index, eth1_deposit_index_mut, u64);

    ref_accessor!(fork, fork_mut, Fork);
    ref_accessor!(latest_block_header, latest_block_header_mut, BeaconBlockHeader);
    ref_accessor!(
        block_roots,
        block_roots_mut,
        FixedVector<H256, C::SlotsPerHistoricalRoot>
    );
    ref_accessor!(
        state_roots,
        state_roots_mut,
        FixedVector<H256, C::SlotsPerHistoricalRoot>
    );
    ref_accessor!(
        historical_roots,
        historical_roots_mut,
        VariableList<H256, C::HistoricalRootsLimit>
    );
    ref_accessor!(eth1_data, eth1_data_mut, Eth1Data);
    ref_accessor!(
        eth1_data_votes,
        eth1_data_votes_mut,
        VariableList<Eth1Data, C::SlotsPerEth1VotingPeriod>
    );
    ref_accessor!(
        validators,
        validators_mut,
        VariableList<Validator, C::ValidatorRegistryLimit>
    );
    ref_accessor!(
        balances,
        balances_mut,
        VariableList<Gwei, C::ValidatorRegistryLimit>
    );
    ref_accessor!(
        randao_mixes,
        randao_mixes_mut,
        FixedVector<H256, C::EpochsPerHistoricalVector>
    );
    ref_accessor!(
        slashings,
        slashings_mut,
        FixedVector<Gwei, C::EpochsPerSlashingsVector>
    );
    ref_accessor!(
        justification_bits,
        justification_bits_mut,
        BitVector<JustificationBitsLength>
    );
    ref_accessor!(
        previous_justified_checkpoint,
        previous_justified_checkpoint_mut,
        Checkpoint
    );
    ref_accessor!(
        current_justified_checkpoint,
        current_justified_checkpoint_mut,
        Checkpoint
    );
    ref_accessor!(finalized_checkpoint, finalized_checkpoint_mut, Checkpoint);

    participation_accessor!(
        previous_epoch_participation,
        previous_epoch_participation_mut,
        VariableList<ParticipationFlags, C::ValidatorRegistryLimit>
    );
    participation_accessor!(
        current_epoch_participation,
        current_epoch_participation_mut,
        VariableList<ParticipationFlags, C::ValidatorRegistryLimit>
    );
    participation_accessor!(
        inactivity_scores,
        inactivity_scores_mut,
        VariableList<u64, C::ValidatorRegistryLimit>
    );
    participation_accessor!(
        current_sync_committee,
        current_sync_committee_mut,
        altair::SyncCommittee<C>
    );
    participation_accessor!(
        next_sync_committee,
        next_sync_committee_mut,
        altair::SyncCommittee<C>
    );

    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
            Self::Merge(_) => ForkName::Merge,
        }
    }

    pub fn as_phase0(&self) -> Option<&phase0::BeaconState<C>> {
        match self {
            Self::Phase0(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_phase0_mut(&mut self) -> Option<&mut phase0::BeaconState<C>> {
        match self {
            Self::Phase0(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_altair(&self) -> Option<&altair::BeaconState<C>> {
        match self {
            Self::Altair(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_altair_mut(&mut self) -> Option<&mut altair::BeaconState<C>> {
        match self {
            Self::Altair(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_merge(&self) -> Option<&merge::BeaconState<C>> {
        match self {
            Self::Merge(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_merge_mut(&mut self) -> Option<&mut merge::BeaconState<C>> {
        match self {
            Self::Merge(state) => Some(state),
            _ => None,
        }
    }

    pub fn latest_execution_payload_header(&self) -> Option<&merge::ExecutionPayloadHeader<C>> {
        match self {
            Self::Merge(state) => Some(&state.latest_execution_payload_header),
            _ => None,
        }
    }

    pub fn latest_execution_payload_header_mut(
        &mut self,
    ) -> Option<&mut merge::ExecutionPayloadHeader<C>> {
        match self {
            Self::Merge(state) => Some(&mut state.latest_execution_payload_header),
            _ => None,
        }
    }

    pub fn tree_hash_root(&self) -> H256 {
        match self {
            Self::Phase0(state) => ssz::TreeHash::tree_hash_root(state),
            Self::Altair(state) => ssz::TreeHash::tree_hash_root(state),
            Self::Merge(state) => ssz::TreeHash::tree_hash_root(state),
        }
    }

    pub fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            Self::Phase0(state) => state.as_ssz_bytes(),
            Self::Altair(state) => state.as_ssz_bytes(),
            Self::Merge(state) => state.as_ssz_bytes(),
        }
    }

    /// The wire image alone does not identify the fork, the caller names it.
    pub fn from_ssz_bytes(bytes: &[u8], fork: ForkName) -> Result<Self, SszDecodeError> {
        match fork {
            ForkName::Phase0 => phase0::BeaconState::from_ssz_bytes(bytes).map(Self::Phase0),
            ForkName::Altair => altair::BeaconState::from_ssz_bytes(bytes).map(Self::Altair),
            ForkName::Merge => merge::BeaconState::from_ssz_bytes(bytes).map(Self::Merge),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinimalConfig;

    #[test]
    fn accessors_agree_across_forks() {
        let mut state: BeaconState<MinimalConfig> =
            BeaconState::Altair(altair::BeaconState::default());
        *state.slot_mut() = 17;
        assert_eq!(state.slot(), 17);
        assert_eq!(state.fork_name(), ForkName::Altair);
        assert!(state.inactivity_scores().is_some());
        assert!(state.as_phase0().is_none());
    }

    #[test]
    fn phase0_has_no_participation_fields() {
        let state: BeaconState<MinimalConfig> =
            BeaconState::Phase0(phase0::BeaconState::default());
        assert!(state.previous_epoch_participation().is_none());
        assert!(state.current_sync_committee().is_none());
        assert!(state.latest_execution_payload_header().is_none());
    }

    #[test]
    fn ssz_round_trip_is_fork_tagged() {
        let state: BeaconState<MinimalConfig> =
            BeaconState::Merge(merge::BeaconState::default());
        let bytes = state.as_ssz_bytes();
        let decoded =
            BeaconState::<MinimalConfig>::from_ssz_bytes(&bytes, ForkName::Merge).expect("Test");
        assert_eq!(decoded, state);
        assert!(
            BeaconState::<MinimalConfig>::from_ssz_bytes(&bytes, ForkName::Phase0).is_err()
        );
    }
}
