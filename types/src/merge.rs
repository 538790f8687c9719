use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{BitVector, FixedVector, VariableList};
use ssz_derive::{SszDecode, SszEncode, TreeHash};

use crate::altair::{SyncAggregate, SyncCommittee};
use crate::config::Config;
use crate::consts::{JustificationBitsLength, ParticipationFlags};
use crate::primitives::*;
use crate::types::*;

/// An opaque execution-layer transaction.
pub type Transaction<C> = VariableList<u8, <C as Config>::MaxBytesPerTransaction>;

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct ExecutionPayload<C: Config> {
    pub parent_hash: H256,
    pub coinbase: ExecutionAddress,
    pub state_root: H256,
    pub receipt_root: H256,
    pub logs_bloom: FixedVector<u8, C::BytesPerLogsBloom>,
    pub random: H256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: UnixSeconds,
    pub block_hash: H256,
    pub transactions: VariableList<Transaction<C>, C::MaxTransactionsPerPayload>,
}

impl<C: Config> Default for ExecutionPayload<C> {
    fn default() -> Self {
        Self {
            parent_hash: Default::default(),
            coinbase: Default::default(),
            state_root: Default::default(),
            receipt_root: Default::default(),
            logs_bloom: Default::default(),
            random: Default::default(),
            block_number: Default::default(),
            gas_limit: Default::default(),
            gas_used: Default::default(),
            timestamp: Default::default(),
            block_hash: Default::default(),
            transactions: Default::default(),
        }
    }
}

impl<C: Config> ExecutionPayload<C> {
    pub fn header(&self) -> ExecutionPayloadHeader<C> {
        ExecutionPayloadHeader {
            parent_hash: self.parent_hash,
            coinbase: self.coinbase,
            state_root: self.state_root,
            receipt_root: self.receipt_root,
            logs_bloom: self.logs_bloom.clone(),
            random: self.random,
            block_number: self.block_number,
            gas_limit: self.gas_limit,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
            block_hash: self.block_hash,
            transactions_root: ssz::TreeHash::tree_hash_root(&self.transactions),
        }
    }

    /// An all-default payload carries no execution block, which is the
    /// pre-transition condition.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct ExecutionPayloadHeader<C: Config> {
    pub parent_hash: H256,
    pub coinbase: ExecutionAddress,
    pub state_root: H256,
    pub receipt_root: H256,
    pub logs_bloom: FixedVector<u8, C::BytesPerLogsBloom>,
    pub random: H256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: UnixSeconds,
    pub block_hash: H256,
    pub transactions_root: H256,
}

impl<C: Config> Default for ExecutionPayloadHeader<C> {
    fn default() -> Self {
        ExecutionPayload::<C>::default().header()
    }
}

impl<C: Config> ExecutionPayloadHeader<C> {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
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
    pub execution_payload: ExecutionPayload<C>,
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
            execution_payload: Default::default(),
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

    // Execution
    pub latest_execution_payload_header: ExecutionPayloadHeader<C>,
}
