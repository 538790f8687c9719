use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{BitVector, FixedVector, VariableList};
use ssz_derive::{SszDecode, SszEncode, TreeHash};

use crate::config::Config;
use crate::consts::{JustificationBitsLength, ParticipationFlags};
use crate::primitives::*;
use crate::types::*;

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct SyncCommittee<C: Config> {
    pub pubkeys: FixedVector<PublicKeyBytes, C::SyncCommitteeSize>,
    pub aggregate_pubkey: PublicKeyBytes,
}

impl<C: Config> Default for SyncCommittee<C> {
    fn default() -> Self {
        Self {
            pubkeys: Default::default(),
            aggregate_pubkey: PublicKeyBytes::empty(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct SyncAggregate<C: Config> {
    pub sync_committee_bits: BitVector<C::SyncCommitteeSize>,
    pub sync_committee_signature: SignatureBytes,
}

impl<C: Config> Default for SyncAggregate<C> {
    fn default() -> Self {
        Self {
            sync_committee_bits: Default::default(),
            sync_committee_signature: SignatureBytes::empty(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct BeaconBlockBody<C: Config> {
    pub randao_reveal: SignatureBytes,
    pub eth1_data: Eth1Data,
    pub graffiti: H256,
    pub proposer_slashings: VariableList<ProposerSlashing, C::MaxProposerSlashings>,
    pub attester_slashings: VariableList<AttesterSlashing<C>, C::MaxAttesterSlashings>,
    pub attestations: VariableList<Attestation<C>, C::MaxAttestations>,
    pub deposits: VariableList<Deposit, C::MaxDeposits>,
    pub voluntary_exits: VariableList<SignedVoluntaryExit, C::MaxVoluntaryExits>,
    pub sync_aggregate: SyncAggregate<C>,
}

impl<C: Config> Default for BeaconBlockBody<C> {
    fn default() -> Self {
        Self {
            randao_reveal: SignatureBytes::empty(),
            eth1_data: Default::default(),
            graffiti: Default::default(),
            proposer_slashings: Default::default(),
            attester_slashings: Default::default(),
            attestations: Default::default(),
            deposits: Default::default(),
            voluntary_exits: Default::default(),
            sync_aggregate: Default::default(),
        }
    }
}

#[derive(
    Clone, PartialEq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode, TreeHash,
)]
#[serde(bound = "C: Config")]
pub struct BeaconBlock<C: Config> {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body: BeaconBlockBody<C>,
}

impl<C: Config> BeaconBlock<C> {
    pub fn temporary_header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            state_root: H256::zero(),
            body_root: ssz::TreeHash::tree_hash_root(&self.body),
        }
    }
}

#[derive(
    Clone, PartialEq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode, TreeHash,
)]
#[serde(bound = "C: Config")]
pub struct SignedBeaconBlock<C: Config> {
    pub message: BeaconBlock<C>,
    pub signature: SignatureBytes,
}

#[derive(
    Clone, PartialEq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode, TreeHash,
)]
#[serde(bound = "C: Config")]
pub struct BeaconState<C: Config> {
    // Versioning
    pub genesis_time: UnixSeconds,
    pub genesis_validators_root: H256,
    pub slot: Slot,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub historical_roots: VariableList<H256, C::HistoricalRootsLimit>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, C::SlotsPerEth1VotingPeriod>,
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: VariableList<Validator, C::ValidatorRegistryLimit>,
    pub balances: VariableList<Gwei, C::ValidatorRegistryLimit>,

    // Randomness
    pub randao_mixes: FixedVector<H256, C::EpochsPerHistoricalVector>,

    // Slashings
    pub slashings: FixedVector<Gwei, C::EpochsPerSlashingsVector>,

    // Participation
    pub previous_epoch_participation:
        VariableList<ParticipationFlags, C::ValidatorRegistryLimit>,
    pub current_epoch_participation: VariableList<ParticipationFlags, C::ValidatorRegistryLimit>,

    // Finality
    pub justification_bits: BitVector<JustificationBitsLength>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,

    // Inactivity
    pub inactivity_scores: VariableList<u64, C::ValidatorRegistryLimit>,

    // Sync
    pub current_sync_committee: SyncCommittee<C>,
    pub next_sync_committee: SyncCommittee<C>,
}
