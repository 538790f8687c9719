pub use crate::primitives::{Epoch, Slot};

pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const FAR_FUTURE_EPOCH: Epoch = u64::max_value();
pub const BASE_REWARDS_PER_EPOCH: u64 = 4;
pub const SECONDS_PER_DAY: u64 = 86400;

pub const JUSTIFICATION_BITS_LENGTH: usize = 4;
pub type JustificationBitsLength = typenum::U4;

pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;
pub type DepositContractTreeDepth = typenum::U32;

// Participation flag indices and the reward weights attached to them
// (altair and later).
pub type ParticipationFlags = u8;

pub const TIMELY_SOURCE_FLAG_INDEX: usize = 0;
pub const TIMELY_TARGET_FLAG_INDEX: usize = 1;
pub const TIMELY_HEAD_FLAG_INDEX: usize = 2;

pub const TIMELY_SOURCE_WEIGHT: u64 = 14;
pub const TIMELY_TARGET_WEIGHT: u64 = 26;
pub const TIMELY_HEAD_WEIGHT: u64 = 14;
pub const SYNC_REWARD_WEIGHT: u64 = 2;
pub const PROPOSER_WEIGHT: u64 = 8;
pub const WEIGHT_DENOMINATOR: u64 = 64;

pub const PARTICIPATION_FLAG_WEIGHTS: [(usize, u64); 3] = [
    (TIMELY_SOURCE_FLAG_INDEX, TIMELY_SOURCE_WEIGHT),
    (TIMELY_TARGET_FLAG_INDEX, TIMELY_TARGET_WEIGHT),
    (TIMELY_HEAD_FLAG_INDEX, TIMELY_HEAD_WEIGHT),
];

pub fn has_flag(flags: ParticipationFlags, flag_index: usize) -> bool {
    flags & (1 << flag_index) != 0
}

pub fn add_flag(flags: ParticipationFlags, flag_index: usize) -> ParticipationFlags {
    flags | (1 << flag_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_denominator() {
        let flag_weights: u64 = PARTICIPATION_FLAG_WEIGHTS
            .iter()
            .map(|(_, weight)| weight)
            .sum();
        assert_eq!(
            flag_weights + SYNC_REWARD_WEIGHT + PROPOSER_WEIGHT,
            WEIGHT_DENOMINATOR
        );
    }

    #[test]
    fn flag_arithmetic() {
        let flags = add_flag(0, TIMELY_TARGET_FLAG_INDEX);
        assert!(has_flag(flags, TIMELY_TARGET_FLAG_INDEX));
        assert!(!has_flag(flags, TIMELY_SOURCE_FLAG_INDEX));
        assert_eq!(add_flag(flags, TIMELY_TARGET_FLAG_INDEX), flags);
    }
}
