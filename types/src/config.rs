use core::fmt::Debug;
use core::hash::Hash;

use typenum::Unsigned;

use crate::consts::FAR_FUTURE_EPOCH;
use crate::primitives::{DomainType, Epoch, Gwei, Slot, UnixSeconds, Version};

/// Bound required of every schema-level length parameter.
pub trait Length:
    Unsigned + Clone + Copy + Default + Debug + PartialEq + Eq + Hash + Send + Sync + 'static
{
}

impl<N> Length for N where
    N: Unsigned + Clone + Copy + Default + Debug + PartialEq + Eq + Hash + Send + Sync + 'static
{
}

/// A network preset. All schema bounds are associated types so that list and
/// vector capacities are fixed at compile time; scalar constants are plain
/// functions. Domain tags default to the values shared by every network.
pub trait Config:
    Clone + Copy + Default + Debug + PartialEq + Eq + Hash + Send + Sync + 'static
{
    const NAME: &'static str;

    type SlotsPerEpoch: Length;
    type SlotsPerHistoricalRoot: Length;
    type SlotsPerEth1VotingPeriod: Length;
    type EpochsPerHistoricalVector: Length;
    type EpochsPerSlashingsVector: Length;
    type HistoricalRootsLimit: Length;
    type ValidatorRegistryLimit: Length;
    type MaxValidatorsPerCommittee: Length;
    type MaxProposerSlashings: Length;
    type MaxAttesterSlashings: Length;
    type MaxAttestations: Length;
    type MaxDeposits: Length;
    type MaxVoluntaryExits: Length;
    /// `MAX_ATTESTATIONS * SLOTS_PER_EPOCH`, the bound of the pending
    /// attestation lists in phase0 states.
    type MaxAttestationsPerEpoch: Length;
    type SyncCommitteeSize: Length;
    type MaxBytesPerTransaction: Length;
    type MaxTransactionsPerPayload: Length;
    type BytesPerLogsBloom: Length;
    type MaxExtraDataBytes: Length;

    // Time parameters.
    fn seconds_per_slot() -> u64;
    fn min_attestation_inclusion_delay() -> Slot {
        1
    }
    fn min_seed_lookahead() -> Epoch {
        1
    }
    fn max_seed_lookahead() -> Epoch {
        4
    }
    fn epochs_per_eth1_voting_period() -> Epoch;
    fn min_validator_withdrawability_delay() -> Epoch {
        256
    }
    fn shard_committee_period() -> Epoch;
    fn min_epochs_to_inactivity_penalty() -> Epoch {
        4
    }
    fn epochs_per_sync_committee_period() -> Epoch;

    // Misc.
    fn max_committees_per_slot() -> u64;
    fn target_committee_size() -> u64;
    fn shuffle_round_count() -> u8;
    fn min_per_epoch_churn_limit() -> u64 {
        4
    }
    fn churn_limit_quotient() -> u64;
    fn safe_slots_to_update_justified() -> Slot;
    fn target_aggregators_per_committee() -> u64 {
        16
    }

    // Genesis.
    fn min_genesis_active_validator_count() -> u64;
    fn min_genesis_time() -> UnixSeconds;
    fn genesis_delay() -> u64;

    // Gwei values.
    fn min_deposit_amount() -> Gwei {
        1_000_000_000
    }
    fn max_effective_balance() -> Gwei {
        32_000_000_000
    }
    fn ejection_balance() -> Gwei {
        16_000_000_000
    }
    fn effective_balance_increment() -> Gwei {
        1_000_000_000
    }

    // Hysteresis of the effective-balance requantisation.
    fn hysteresis_quotient() -> u64 {
        4
    }
    fn hysteresis_downward_multiplier() -> u64 {
        1
    }
    fn hysteresis_upward_multiplier() -> u64 {
        5
    }

    // Reward and penalty quotients. The altair variants supersede the phase0
    // ones from the altair fork onward.
    fn base_reward_factor() -> u64 {
        64
    }
    fn whistleblower_reward_quotient() -> u64 {
        512
    }
    fn proposer_reward_quotient() -> u64 {
        8
    }
    fn inactivity_penalty_quotient() -> u64 {
        1 << 26
    }
    fn min_slashing_penalty_quotient() -> u64 {
        128
    }
    fn proportional_slashing_multiplier() -> u64 {
        1
    }
    fn inactivity_penalty_quotient_altair() -> u64 {
        3 * (1 << 24)
    }
    fn min_slashing_penalty_quotient_altair() -> u64 {
        64
    }
    fn proportional_slashing_multiplier_altair() -> u64 {
        2
    }

    // Inactivity scores (altair and later).
    fn inactivity_score_bias() -> u64 {
        4
    }
    fn inactivity_score_recovery_rate() -> u64 {
        16
    }
    fn min_sync_committee_participants() -> u64 {
        1
    }

    // Fork versions.
    fn genesis_fork_version() -> Version;
    fn altair_fork_version() -> Version;
    fn merge_fork_version() -> Version;

    // Signature domains.
    fn domain_beacon_proposer() -> DomainType {
        [0, 0, 0, 0]
    }
    fn domain_beacon_attester() -> DomainType {
        [1, 0, 0, 0]
    }
    fn domain_randao() -> DomainType {
        [2, 0, 0, 0]
    }
    fn domain_deposit() -> DomainType {
        [3, 0, 0, 0]
    }
    fn domain_voluntary_exit() -> DomainType {
        [4, 0, 0, 0]
    }
    fn domain_selection_proof() -> DomainType {
        [5, 0, 0, 0]
    }
    fn domain_aggregate_and_proof() -> DomainType {
        [6, 0, 0, 0]
    }
    fn domain_sync_committee() -> DomainType {
        [7, 0, 0, 0]
    }
    fn domain_sync_committee_selection_proof() -> DomainType {
        [8, 0, 0, 0]
    }
    fn domain_contribution_and_proof() -> DomainType {
        [9, 0, 0, 0]
    }

    fn genesis_epoch() -> Epoch {
        crate::consts::GENESIS_EPOCH
    }

    fn far_future_epoch() -> Epoch {
        FAR_FUTURE_EPOCH
    }

    fn fork_version(fork: ForkName) -> Version {
        match fork {
            ForkName::Phase0 => Self::genesis_fork_version(),
            ForkName::Altair => Self::altair_fork_version(),
            ForkName::Merge => Self::merge_fork_version(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct MainnetConfig;

impl Config for MainnetConfig {
    const NAME: &'static str = "mainnet";

    type SlotsPerEpoch = typenum::U32;
    type SlotsPerHistoricalRoot = typenum::U8192;
    type SlotsPerEth1VotingPeriod = typenum::U2048;
    type EpochsPerHistoricalVector = typenum::U65536;
    type EpochsPerSlashingsVector = typenum::U8192;
    type HistoricalRootsLimit = typenum::U16777216;
    type ValidatorRegistryLimit = typenum::U1099511627776;
    type MaxValidatorsPerCommittee = typenum::U2048;
    type MaxProposerSlashings = typenum::U16;
    type MaxAttesterSlashings = typenum::U2;
    type MaxAttestations = typenum::U128;
    type MaxDeposits = typenum::U16;
    type MaxVoluntaryExits = typenum::U16;
    type MaxAttestationsPerEpoch = typenum::U4096;
    type SyncCommitteeSize = typenum::U512;
    type MaxBytesPerTransaction = typenum::U1073741824;
    type MaxTransactionsPerPayload = typenum::U1048576;
    type BytesPerLogsBloom = typenum::U256;
    type MaxExtraDataBytes = typenum::U32;

    fn seconds_per_slot() -> u64 {
        12
    }

    fn epochs_per_eth1_voting_period() -> Epoch {
        64
    }

    fn shard_committee_period() -> Epoch {
        256
    }

    fn epochs_per_sync_committee_period() -> Epoch {
        256
    }

    fn max_committees_per_slot() -> u64 {
        64
    }

    fn target_committee_size() -> u64 {
        128
    }

    fn shuffle_round_count() -> u8 {
        90
    }

    fn churn_limit_quotient() -> u64 {
        1 << 16
    }

    fn safe_slots_to_update_justified() -> Slot {
        8
    }

    fn min_genesis_active_validator_count() -> u64 {
        1 << 14
    }

    fn min_genesis_time() -> UnixSeconds {
        1_606_824_000
    }

    fn genesis_delay() -> u64 {
        604_800
    }

    fn genesis_fork_version() -> Version {
        Version::from([0x00, 0x00, 0x00, 0x00])
    }

    fn altair_fork_version() -> Version {
        Version::from([0x01, 0x00, 0x00, 0x00])
    }

    fn merge_fork_version() -> Version {
        Version::from([0x02, 0x00, 0x00, 0x00])
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct MinimalConfig;

impl Config for MinimalConfig {
    const NAME: &'static str = "minimal";

    type SlotsPerEpoch = typenum::U8;
    type SlotsPerHistoricalRoot = typenum::U64;
    type SlotsPerEth1VotingPeriod = typenum::U32;
    type EpochsPerHistoricalVector = typenum::U64;
    type EpochsPerSlashingsVector = typenum::U64;
    type HistoricalRootsLimit = typenum::U16777216;
    type ValidatorRegistryLimit = typenum::U1099511627776;
    type MaxValidatorsPerCommittee = typenum::U2048;
    type MaxProposerSlashings = typenum::U16;
    type MaxAttesterSlashings = typenum::U2;
    type MaxAttestations = typenum::U128;
    type MaxDeposits = typenum::U16;
    type MaxVoluntaryExits = typenum::U16;
    type MaxAttestationsPerEpoch = typenum::U1024;
    type SyncCommitteeSize = typenum::U32;
    type MaxBytesPerTransaction = typenum::U1073741824;
    type MaxTransactionsPerPayload = typenum::U1048576;
    type BytesPerLogsBloom = typenum::U256;
    type MaxExtraDataBytes = typenum::U32;

    fn seconds_per_slot() -> u64 {
        6
    }

    fn epochs_per_eth1_voting_period() -> Epoch {
        4
    }

    fn shard_committee_period() -> Epoch {
        64
    }

    fn epochs_per_sync_committee_period() -> Epoch {
        8
    }

    fn max_committees_per_slot() -> u64 {
        4
    }

    fn target_committee_size() -> u64 {
        4
    }

    fn shuffle_round_count() -> u8 {
        10
    }

    fn churn_limit_quotient() -> u64 {
        32
    }

    fn safe_slots_to_update_justified() -> Slot {
        2
    }

    fn min_genesis_active_validator_count() -> u64 {
        64
    }

    fn min_genesis_time() -> UnixSeconds {
        1_578_009_600
    }

    fn genesis_delay() -> u64 {
        300
    }

    fn genesis_fork_version() -> Version {
        Version::from([0x00, 0x00, 0x00, 0x01])
    }

    fn altair_fork_version() -> Version {
        Version::from([0x01, 0x00, 0x00, 0x01])
    }

    fn merge_fork_version() -> Version {
        Version::from([0x02, 0x00, 0x00, 0x01])
    }
}

/// Protocol upgrades in activation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ForkName {
    Phase0,
    Altair,
    Merge,
}

impl ForkName {
    pub fn as_str(self) -> &'static str {
        match self {
            ForkName::Phase0 => "phase0",
            ForkName::Altair => "altair",
            ForkName::Merge => "merge",
        }
    }
}

/// Activation epochs of the fork sequence. A fork with `FAR_FUTURE_EPOCH`
/// never activates. Kept out of `Config` because the schedule varies per
/// network deployment, not per preset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ForkSchedule {
    pub altair_fork_epoch: Epoch,
    pub merge_fork_epoch: Epoch,
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self {
            altair_fork_epoch: FAR_FUTURE_EPOCH,
            merge_fork_epoch: FAR_FUTURE_EPOCH,
        }
    }
}

impl ForkSchedule {
    pub fn phase0_only() -> Self {
        Self::default()
    }

    pub fn with_altair(altair_fork_epoch: Epoch) -> Self {
        Self {
            altair_fork_epoch,
            merge_fork_epoch: FAR_FUTURE_EPOCH,
        }
    }

    pub fn with_merge(altair_fork_epoch: Epoch, merge_fork_epoch: Epoch) -> Self {
        assert!(altair_fork_epoch <= merge_fork_epoch);
        Self {
            altair_fork_epoch,
            merge_fork_epoch,
        }
    }

    pub fn fork_at_epoch(&self, epoch: Epoch) -> ForkName {
        if epoch >= self.merge_fork_epoch {
            ForkName::Merge
        } else if epoch >= self.altair_fork_epoch {
            ForkName::Altair
        } else {
            ForkName::Phase0
        }
    }
}
