//! Runtime preset documents. The compile-time [`Config`](crate::config::Config)
//! implementations fix the schema bounds; this module covers the flat
//! key–value YAML form the networks publish, so a deployment can be checked
//! or overridden without recompiling.

use std::collections::BTreeMap;

use log::warn;
use thiserror::Error;

use crate::config::ForkSchedule;
use crate::consts::FAR_FUTURE_EPOCH;
use crate::primitives::{Epoch, Gwei, UnixSeconds, Version};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset document is not a mapping")]
    NotAMapping,
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("missing required key {0}")]
    MissingKey(&'static str),
    #[error("key {key} has invalid integer value {value:?}")]
    InvalidInteger { key: &'static str, value: String },
    #[error("key {key} must be {expected} bytes of 0x-prefixed hex, got {value:?}")]
    InvalidBytes {
        key: &'static str,
        expected: usize,
        value: String,
    },
}

/// Every network-level constant as published in the canonical preset files.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Preset {
    pub config_name: String,

    // Misc.
    pub max_committees_per_slot: u64,
    pub target_committee_size: u64,
    pub max_validators_per_committee: u64,
    pub min_per_epoch_churn_limit: u64,
    pub churn_limit_quotient: u64,
    pub shuffle_round_count: u64,

    // Genesis.
    pub min_genesis_active_validator_count: u64,
    pub min_genesis_time: UnixSeconds,
    pub genesis_delay: u64,
    pub genesis_fork_version: Version,

    // Balance math.
    pub hysteresis_quotient: u64,
    pub hysteresis_downward_multiplier: u64,
    pub hysteresis_upward_multiplier: u64,

    // Fork choice.
    pub safe_slots_to_update_justified: u64,

    // Gwei values.
    pub min_deposit_amount: Gwei,
    pub max_effective_balance: Gwei,
    pub ejection_balance: Gwei,
    pub effective_balance_increment: Gwei,

    // Time parameters.
    pub seconds_per_slot: u64,
    pub min_attestation_inclusion_delay: u64,
    pub slots_per_epoch: u64,
    pub min_seed_lookahead: Epoch,
    pub max_seed_lookahead: Epoch,
    pub epochs_per_eth1_voting_period: Epoch,
    pub slots_per_historical_root: u64,
    pub min_validator_withdrawability_delay: Epoch,
    pub shard_committee_period: Epoch,
    pub min_epochs_to_inactivity_penalty: Epoch,

    // State vector lengths.
    pub epochs_per_historical_vector: u64,
    pub epochs_per_slashings_vector: u64,
    pub historical_roots_limit: u64,
    pub validator_registry_limit: u64,

    // Reward and penalty quotients.
    pub base_reward_factor: u64,
    pub whistleblower_reward_quotient: u64,
    pub proposer_reward_quotient: u64,
    pub inactivity_penalty_quotient: u64,
    pub min_slashing_penalty_quotient: u64,
    pub proportional_slashing_multiplier: u64,

    // Max operations per block.
    pub max_proposer_slashings: u64,
    pub max_attester_slashings: u64,
    pub max_attestations: u64,
    pub max_deposits: u64,
    pub max_voluntary_exits: u64,

    // Altair.
    pub altair_fork_version: Version,
    pub altair_fork_epoch: Epoch,
    pub inactivity_penalty_quotient_altair: u64,
    pub min_slashing_penalty_quotient_altair: u64,
    pub proportional_slashing_multiplier_altair: u64,
    pub sync_committee_size: u64,
    pub epochs_per_sync_committee_period: Epoch,
    pub inactivity_score_bias: u64,
    pub inactivity_score_recovery_rate: u64,
    pub min_sync_committee_participants: u64,

    // Merge.
    pub merge_fork_version: Version,
    pub merge_fork_epoch: Epoch,
}

impl Preset {
    pub fn mainnet() -> Self {
        Self {
            config_name: "mainnet".to_string(),
            max_committees_per_slot: 64,
            target_committee_size: 128,
            max_validators_per_committee: 2048,
            min_per_epoch_churn_limit: 4,
            churn_limit_quotient: 1 << 16,
            shuffle_round_count: 90,
            min_genesis_active_validator_count: 1 << 14,
            min_genesis_time: 1_606_824_000,
            genesis_delay: 604_800,
            genesis_fork_version: Version::from([0x00, 0x00, 0x00, 0x00]),
            hysteresis_quotient: 4,
            hysteresis_downward_multiplier: 1,
            hysteresis_upward_multiplier: 5,
            safe_slots_to_update_justified: 8,
            min_deposit_amount: 1_000_000_000,
            max_effective_balance: 32_000_000_000,
            ejection_balance: 16_000_000_000,
            effective_balance_increment: 1_000_000_000,
            seconds_per_slot: 12,
            min_attestation_inclusion_delay: 1,
            slots_per_epoch: 32,
            min_seed_lookahead: 1,
            max_seed_lookahead: 4,
            epochs_per_eth1_voting_period: 64,
            slots_per_historical_root: 8192,
            min_validator_withdrawability_delay: 256,
            shard_committee_period: 256,
            min_epochs_to_inactivity_penalty: 4,
            epochs_per_historical_vector: 1 << 16,
            epochs_per_slashings_vector: 1 << 13,
            historical_roots_limit: 1 << 24,
            validator_registry_limit: 1 << 40,
            base_reward_factor: 64,
            whistleblower_reward_quotient: 512,
            proposer_reward_quotient: 8,
            inactivity_penalty_quotient: 1 << 26,
            min_slashing_penalty_quotient: 128,
            proportional_slashing_multiplier: 1,
            max_proposer_slashings: 16,
            max_attester_slashings: 2,
            max_attestations: 128,
            max_deposits: 16,
            max_voluntary_exits: 16,
            altair_fork_version: Version::from([0x01, 0x00, 0x00, 0x00]),
            altair_fork_epoch: FAR_FUTURE_EPOCH,
            inactivity_penalty_quotient_altair: 3 * (1 << 24),
            min_slashing_penalty_quotient_altair: 64,
            proportional_slashing_multiplier_altair: 2,
            sync_committee_size: 512,
            epochs_per_sync_committee_period: 256,
            inactivity_score_bias: 4,
            inactivity_score_recovery_rate: 16,
            min_sync_committee_participants: 1,
            merge_fork_version: Version::from([0x02, 0x00, 0x00, 0x00]),
            merge_fork_epoch: FAR_FUTURE_EPOCH,
        }
    }

    pub fn minimal() -> Self {
        Self {
            config_name: "minimal".to_string(),
            max_committees_per_slot: 4,
            target_committee_size: 4,
            churn_limit_quotient: 32,
            shuffle_round_count: 10,
            min_genesis_active_validator_count: 64,
            min_genesis_time: 1_578_009_600,
            genesis_delay: 300,
            genesis_fork_version: Version::from([0x00, 0x00, 0x00, 0x01]),
            safe_slots_to_update_justified: 2,
            seconds_per_slot: 6,
            slots_per_epoch: 8,
            epochs_per_eth1_voting_period: 4,
            slots_per_historical_root: 64,
            shard_committee_period: 64,
            epochs_per_historical_vector: 64,
            epochs_per_slashings_vector: 64,
            altair_fork_version: Version::from([0x01, 0x00, 0x00, 0x01]),
            sync_committee_size: 32,
            epochs_per_sync_committee_period: 8,
            merge_fork_version: Version::from([0x02, 0x00, 0x00, 0x01]),
            ..Self::mainnet()
        }
    }

    pub fn fork_schedule(&self) -> ForkSchedule {
        ForkSchedule {
            altair_fork_epoch: self.altair_fork_epoch,
            merge_fork_epoch: self.merge_fork_epoch,
        }
    }

    pub fn from_yaml(source: &str) -> Result<Self, PresetError> {
        let document: serde_yaml::Value = serde_yaml::from_str(source)?;
        let mapping = match document {
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => return Err(PresetError::NotAMapping),
        };

        let mut raw: BTreeMap<String, serde_yaml::Value> = BTreeMap::new();
        for (key, value) in mapping {
            if let serde_yaml::Value::String(key) = key {
                raw.insert(key, value);
            }
        }

        let preset = Self {
            config_name: take_string(&mut raw, "CONFIG_NAME").unwrap_or_default(),
            max_committees_per_slot: take_u64(&mut raw, "MAX_COMMITTEES_PER_SLOT")?,
            target_committee_size: take_u64(&mut raw, "TARGET_COMMITTEE_SIZE")?,
            max_validators_per_committee: take_u64(&mut raw, "MAX_VALIDATORS_PER_COMMITTEE")?,
            min_per_epoch_churn_limit: take_u64(&mut raw, "MIN_PER_EPOCH_CHURN_LIMIT")?,
            churn_limit_quotient: take_u64(&mut raw, "CHURN_LIMIT_QUOTIENT")?,
            shuffle_round_count: take_u64(&mut raw, "SHUFFLE_ROUND_COUNT")?,
            min_genesis_active_validator_count: take_u64(
                &mut raw,
                "MIN_GENESIS_ACTIVE_VALIDATOR_COUNT",
            )?,
            min_genesis_time: take_u64(&mut raw, "MIN_GENESIS_TIME")?,
            genesis_delay: take_u64(&mut raw, "GENESIS_DELAY")?,
            genesis_fork_version: take_version(&mut raw, "GENESIS_FORK_VERSION")?,
            hysteresis_quotient: take_u64(&mut raw, "HYSTERESIS_QUOTIENT")?,
            hysteresis_downward_multiplier: take_u64(&mut raw, "HYSTERESIS_DOWNWARD_MULTIPLIER")?,
            hysteresis_upward_multiplier: take_u64(&mut raw, "HYSTERESIS_UPWARD_MULTIPLIER")?,
            safe_slots_to_update_justified: take_u64(&mut raw, "SAFE_SLOTS_TO_UPDATE_JUSTIFIED")?,
            min_deposit_amount: take_u64(&mut raw, "MIN_DEPOSIT_AMOUNT")?,
            max_effective_balance: take_u64(&mut raw, "MAX_EFFECTIVE_BALANCE")?,
            ejection_balance: take_u64(&mut raw, "EJECTION_BALANCE")?,
            effective_balance_increment: take_u64(&mut raw, "EFFECTIVE_BALANCE_INCREMENT")?,
            seconds_per_slot: take_u64(&mut raw, "SECONDS_PER_SLOT")?,
            min_attestation_inclusion_delay: take_u64(
                &mut raw,
                "MIN_ATTESTATION_INCLUSION_DELAY",
            )?,
            slots_per_epoch: take_u64(&mut raw, "SLOTS_PER_EPOCH")?,
            min_seed_lookahead: take_u64(&mut raw, "MIN_SEED_LOOKAHEAD")?,
            max_seed_lookahead: take_u64(&mut raw, "MAX_SEED_LOOKAHEAD")?,
            epochs_per_eth1_voting_period: take_u64(&mut raw, "EPOCHS_PER_ETH1_VOTING_PERIOD")?,
            slots_per_historical_root: take_u64(&mut raw, "SLOTS_PER_HISTORICAL_ROOT")?,
            min_validator_withdrawability_delay: take_u64(
                &mut raw,
                "MIN_VALIDATOR_WITHDRAWABILITY_DELAY",
            )?,
            shard_committee_period: take_u64(&mut raw, "SHARD_COMMITTEE_PERIOD")?,
            min_epochs_to_inactivity_penalty: take_u64(
                &mut raw,
                "MIN_EPOCHS_TO_INACTIVITY_PENALTY",
            )?,
            epochs_per_historical_vector: take_u64(&mut raw, "EPOCHS_PER_HISTORICAL_VECTOR")?,
            epochs_per_slashings_vector: take_u64(&mut raw, "EPOCHS_PER_SLASHINGS_VECTOR")?,
            historical_roots_limit: take_u64(&mut raw, "HISTORICAL_ROOTS_LIMIT")?,
            validator_registry_limit: take_u64(&mut raw, "VALIDATOR_REGISTRY_LIMIT")?,
            base_reward_factor: take_u64(&mut raw, "BASE_REWARD_FACTOR")?,
            whistleblower_reward_quotient: take_u64(&mut raw, "WHISTLEBLOWER_REWARD_QUOTIENT")?,
            proposer_reward_quotient: take_u64(&mut raw, "PROPOSER_REWARD_QUOTIENT")?,
            inactivity_penalty_quotient: take_u64(&mut raw, "INACTIVITY_PENALTY_QUOTIENT")?,
            min_slashing_penalty_quotient: take_u64(&mut raw, "MIN_SLASHING_PENALTY_QUOTIENT")?,
            proportional_slashing_multiplier: take_u64(
                &mut raw,
                "PROPORTIONAL_SLASHING_MULTIPLIER",
            )?,
            max_proposer_slashings: take_u64(&mut raw, "MAX_PROPOSER_SLASHINGS")?,
            max_attester_slashings: take_u64(&mut raw, "MAX_ATTESTER_SLASHINGS")?,
            max_attestations: take_u64(&mut raw, "MAX_ATTESTATIONS")?,
            max_deposits: take_u64(&mut raw, "MAX_DEPOSITS")?,
            max_voluntary_exits: take_u64(&mut raw, "MAX_VOLUNTARY_EXITS")?,
            altair_fork_version: take_version(&mut raw, "ALTAIR_FORK_VERSION")?,
            altair_fork_epoch: take_u64(&mut raw, "ALTAIR_FORK_EPOCH")?,
            inactivity_penalty_quotient_altair: take_u64(
                &mut raw,
                "INACTIVITY_PENALTY_QUOTIENT_ALTAIR",
            )?,
            min_slashing_penalty_quotient_altair: take_u64(
                &mut raw,
                "MIN_SLASHING_PENALTY_QUOTIENT_ALTAIR",
            )?,
            proportional_slashing_multiplier_altair: take_u64(
                &mut raw,
                "PROPORTIONAL_SLASHING_MULTIPLIER_ALTAIR",
            )?,
            sync_committee_size: take_u64(&mut raw, "SYNC_COMMITTEE_SIZE")?,
            epochs_per_sync_committee_period: take_u64(
                &mut raw,
                "EPOCHS_PER_SYNC_COMMITTEE_PERIOD",
            )?,
            inactivity_score_bias: take_u64(&mut raw, "INACTIVITY_SCORE_BIAS")?,
            inactivity_score_recovery_rate: take_u64(&mut raw, "INACTIVITY_SCORE_RECOVERY_RATE")?,
            min_sync_committee_participants: take_u64(
                &mut raw,
                "MIN_SYNC_COMMITTEE_PARTICIPANTS",
            )?,
            merge_fork_version: take_version(&mut raw, "MERGE_FORK_VERSION")?,
            merge_fork_epoch: take_u64(&mut raw, "MERGE_FORK_EPOCH")?,
        };

        for key in raw.keys() {
            warn!("ignoring unknown preset key {}", key);
        }

        Ok(preset)
    }
}

fn take_string(
    raw: &mut BTreeMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Option<String> {
    match raw.remove(key) {
        Some(serde_yaml::Value::String(string)) => Some(string),
        _ => None,
    }
}

fn take_u64(
    raw: &mut BTreeMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<u64, PresetError> {
    let value = raw.remove(key).ok_or(PresetError::MissingKey(key))?;
    match &value {
        serde_yaml::Value::Number(number) => number.as_u64().ok_or(PresetError::InvalidInteger {
            key,
            value: format!("{:?}", value),
        }),
        serde_yaml::Value::String(string) => {
            let result = if let Some(hex_digits) = string
                .strip_prefix("0x")
                .or_else(|| string.strip_prefix("0X"))
            {
                u64::from_str_radix(hex_digits, 16)
            } else {
                string.parse()
            };
            result.map_err(|_| PresetError::InvalidInteger {
                key,
                value: string.clone(),
            })
        }
        _ => Err(PresetError::InvalidInteger {
            key,
            value: format!("{:?}", value),
        }),
    }
}

fn take_version(
    raw: &mut BTreeMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<Version, PresetError> {
    let value = raw.remove(key).ok_or(PresetError::MissingKey(key))?;
    let string = match value {
        serde_yaml::Value::String(string) => string,
        other => {
            return Err(PresetError::InvalidBytes {
                key,
                expected: 4,
                value: format!("{:?}", other),
            })
        }
    };

    let bytes = string
        .strip_prefix("0x")
        .and_then(|hex_digits| hex::decode(hex_digits).ok())
        .ok_or_else(|| PresetError::InvalidBytes {
            key,
            expected: 4,
            value: string.clone(),
        })?;

    if bytes.len() != 4 {
        return Err(PresetError::InvalidBytes {
            key,
            expected: 4,
            value: string,
        });
    }

    let mut array = [0; 4];
    array.copy_from_slice(&bytes);
    Ok(Version::from(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_SNIPPET: &str = r#"
CONFIG_NAME: minimal
MAX_COMMITTEES_PER_SLOT: 4
TARGET_COMMITTEE_SIZE: 4
MAX_VALIDATORS_PER_COMMITTEE: 2048
MIN_PER_EPOCH_CHURN_LIMIT: 4
CHURN_LIMIT_QUOTIENT: 32
SHUFFLE_ROUND_COUNT: 10
MIN_GENESIS_ACTIVE_VALIDATOR_COUNT: 64
MIN_GENESIS_TIME: 1578009600
GENESIS_DELAY: 300
GENESIS_FORK_VERSION: 0x00000001
HYSTERESIS_QUOTIENT: 4
HYSTERESIS_DOWNWARD_MULTIPLIER: 1
HYSTERESIS_UPWARD_MULTIPLIER: 5
SAFE_SLOTS_TO_UPDATE_JUSTIFIED: 2
MIN_DEPOSIT_AMOUNT: 1000000000
MAX_EFFECTIVE_BALANCE: 32000000000
EJECTION_BALANCE: 16000000000
EFFECTIVE_BALANCE_INCREMENT: 1000000000
SECONDS_PER_SLOT: 6
MIN_ATTESTATION_INCLUSION_DELAY: 1
SLOTS_PER_EPOCH: 8
MIN_SEED_LOOKAHEAD: 1
MAX_SEED_LOOKAHEAD: 4
EPOCHS_PER_ETH1_VOTING_PERIOD: 4
SLOTS_PER_HISTORICAL_ROOT: 64
MIN_VALIDATOR_WITHDRAWABILITY_DELAY: 256
SHARD_COMMITTEE_PERIOD: 64
MIN_EPOCHS_TO_INACTIVITY_PENALTY: 4
EPOCHS_PER_HISTORICAL_VECTOR: 64
EPOCHS_PER_SLASHINGS_VECTOR: 64
HISTORICAL_ROOTS_LIMIT: 16777216
VALIDATOR_REGISTRY_LIMIT: 1099511627776
BASE_REWARD_FACTOR: 64
WHISTLEBLOWER_REWARD_QUOTIENT: 512
PROPOSER_REWARD_QUOTIENT: 8
INACTIVITY_PENALTY_QUOTIENT: 0x4000000
MIN_SLASHING_PENALTY_QUOTIENT: 128
PROPORTIONAL_SLASHING_MULTIPLIER: 1
MAX_PROPOSER_SLASHINGS: 16
MAX_ATTESTER_SLASHINGS: 2
MAX_ATTESTATIONS: 128
MAX_DEPOSITS: 16
MAX_VOLUNTARY_EXITS: 16
ALTAIR_FORK_VERSION: 0x01000001
ALTAIR_FORK_EPOCH: 18446744073709551615
INACTIVITY_PENALTY_QUOTIENT_ALTAIR: 50331648
MIN_SLASHING_PENALTY_QUOTIENT_ALTAIR: 64
PROPORTIONAL_SLASHING_MULTIPLIER_ALTAIR: 2
SYNC_COMMITTEE_SIZE: 32
EPOCHS_PER_SYNC_COMMITTEE_PERIOD: 8
INACTIVITY_SCORE_BIAS: 4
INACTIVITY_SCORE_RECOVERY_RATE: 16
MIN_SYNC_COMMITTEE_PARTICIPANTS: 1
MERGE_FORK_VERSION: 0x02000001
MERGE_FORK_EPOCH: 18446744073709551615
"#;

    #[test]
    fn minimal_yaml_matches_builtin() {
        let loaded = Preset::from_yaml(MINIMAL_SNIPPET).expect("Test");
        assert_eq!(loaded, Preset::minimal());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let source = format!("{}\nSOME_FUTURE_KNOB: 7\n", MINIMAL_SNIPPET);
        assert!(Preset::from_yaml(&source).is_ok());
    }

    #[test]
    fn missing_keys_fail() {
        let source = MINIMAL_SNIPPET.replace("SECONDS_PER_SLOT: 6\n", "");
        match Preset::from_yaml(&source) {
            Err(PresetError::MissingKey(key)) => assert_eq!(key, "SECONDS_PER_SLOT"),
            other => panic!("expected MissingKey, got {:?}", other),
        }
    }

    #[test]
    fn hex_integers_are_accepted() {
        let loaded = Preset::from_yaml(MINIMAL_SNIPPET).expect("Test");
        assert_eq!(loaded.inactivity_penalty_quotient, 1 << 26);
    }

    #[test]
    fn byte_fields_require_exact_length() {
        let source = MINIMAL_SNIPPET.replace("0x01000001", "0x010001");
        assert!(matches!(
            Preset::from_yaml(&source),
            Err(PresetError::InvalidBytes { .. })
        ));
    }
}
