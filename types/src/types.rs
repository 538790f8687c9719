#![allow(clippy::default_trait_access)]

use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{BitList, FixedVector, VariableList};
use ssz_derive::{SszDecode, SszEncode, TreeHash};
use typenum::{Sum, U1};

use crate::config::*;
use crate::consts;
use crate::primitives::*;

#[derive(
    Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash, Default,
)]
pub struct Fork {
    pub previous_version: Version,
    pub current_version: Version,
    pub epoch: Epoch,
}

#[derive(
    Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash, Default,
)]
pub struct ForkData {
    pub current_version: Version,
    pub genesis_validators_root: H256,
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Default,
    Hash,
    Deserialize,
    Serialize,
    SszEncode,
    SszDecode,
    TreeHash,
)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: H256,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub effective_balance: Gwei,
    pub slashed: bool,
    pub activation_eligibility_epoch: Epoch,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
    pub withdrawable_epoch: Epoch,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            pubkey: PublicKeyBytes::empty(),
            withdrawal_credentials: Default::default(),
            effective_balance: Default::default(),
            slashed: Default::default(),
            activation_eligibility_epoch: Default::default(),
            activation_epoch: Default::default(),
            exit_epoch: Default::default(),
            withdrawable_epoch: Default::default(),
        }
    }
}

#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    Hash,
    Deserialize,
    Serialize,
    SszEncode,
    SszDecode,
    TreeHash,
    Default,
)]
pub struct AttestationData {
    pub slot: Slot,
    pub index: CommitteeIndex,
    pub beacon_block_root: H256,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct Attestation<C: Config> {
    pub aggregation_bits: BitList<C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: AggregateSignatureBytes,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct IndexedAttestation<C: Config> {
    pub attesting_indices: VariableList<u64, C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub signature: AggregateSignatureBytes,
}

impl<C: Config> Default for IndexedAttestation<C> {
    fn default() -> Self {
        Self {
            attesting_indices: Default::default(),
            data: Default::default(),
            signature: AggregateSignatureBytes::empty(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct PendingAttestation<C: Config> {
    pub aggregation_bits: BitList<C::MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub inclusion_delay: u64,
    pub proposer_index: ValidatorIndex,
}

#[derive(
    Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode, TreeHash,
)]
pub struct Eth1Data {
    pub deposit_root: H256,
    pub deposit_count: u64,
    pub block_hash: H256,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct DepositMessage {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct DepositData {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
    pub signature: SignatureBytes,
}

impl DepositData {
    pub fn message(&self) -> DepositMessage {
        DepositMessage {
            pubkey: self.pubkey,
            withdrawal_credentials: self.withdrawal_credentials,
            amount: self.amount,
        }
    }
}

pub type DepositProofLength = Sum<consts::DepositContractTreeDepth, U1>;

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct Deposit {
    pub proof: FixedVector<H256, DepositProofLength>,
    pub data: DepositData,
}

#[derive(
    Clone, PartialEq, Eq, Debug, Default, Hash, Deserialize, Serialize, SszEncode, SszDecode,
    TreeHash,
)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

impl BeaconBlockHeader {
    pub fn canonical_root(&self) -> H256 {
        ssz::TreeHash::tree_hash_root(self)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct ProposerSlashing {
    pub signed_header_1: SignedBeaconBlockHeader,
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct AttesterSlashing<C: Config> {
    pub attestation_1: IndexedAttestation<C>,
    pub attestation_2: IndexedAttestation<C>,
}

#[derive(
    Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode, TreeHash,
)]
pub struct VoluntaryExit {
    pub epoch: Epoch,
    pub validator_index: ValidatorIndex,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: SignatureBytes,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize, SszEncode, SszDecode,
    TreeHash,
)]
pub struct SigningData {
    pub object_root: H256,
    pub domain: Domain,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct HistoricalBatch<C: Config> {
    pub block_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
    pub state_roots: FixedVector<H256, C::SlotsPerHistoricalRoot>,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct AggregateAndProof<C: Config> {
    pub aggregator_index: ValidatorIndex,
    pub aggregate: Attestation<C>,
    pub selection_proof: SignatureBytes,
}

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize, SszEncode, SszDecode, TreeHash)]
#[serde(bound = "C: Config")]
pub struct SignedAggregateAndProof<C: Config> {
    pub message: AggregateAndProof<C>,
    pub signature: SignatureBytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::{SszDecode, SszEncode, TreeHash};

    #[test]
    fn validator_is_fixed_size() {
        assert!(<Validator as SszDecode>::is_ssz_fixed_len());
        assert_eq!(<Validator as SszDecode>::ssz_fixed_len(), 121);
    }

    #[test]
    fn checkpoint_round_trip() {
        let checkpoint = Checkpoint {
            epoch: 3,
            root: H256::repeat_byte(9),
        };
        let bytes = checkpoint.as_ssz_bytes();
        assert_eq!(bytes.len(), 40);
        assert_eq!(Checkpoint::from_ssz_bytes(&bytes).expect("Test"), checkpoint);
    }

    #[test]
    fn attestation_round_trip() {
        let attestation: Attestation<MainnetConfig> = Attestation {
            aggregation_bits: BitList::with_capacity(7).expect("Test"),
            data: AttestationData::default(),
            signature: AggregateSignatureBytes::empty(),
        };
        let decoded =
            Attestation::<MainnetConfig>::from_ssz_bytes(&attestation.as_ssz_bytes())
                .expect("Test");
        assert_eq!(decoded, attestation);
    }

    #[test]
    fn header_root_matches_signing_object() {
        let header = BeaconBlockHeader::default();
        assert_eq!(header.canonical_root(), header.tree_hash_root());
    }

    #[test]
    fn deposit_proof_length() {
        use typenum::Unsigned as _;
        assert_eq!(DepositProofLength::to_u64(), 33);
    }
}
