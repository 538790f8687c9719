use ssz::VariableList;

use types::config::Config;
use types::types::Fork;
use types::{altair, merge, phase0};

use crate::epochs::sync_committees::derive_next_sync_committee;
use crate::error::Error;

/// Carries a phase0 state across the altair fork boundary. Pending
/// attestations are dropped, participation starts from a clean slate, and
/// both sync committees are derived from the post-upgrade state.
pub fn upgrade_to_altair<C: Config>(
    pre: phase0::BeaconState<C>,
) -> Result<altair::BeaconState<C>, Error> {
    let epoch = pre.slot / <C::SlotsPerEpoch as typenum::Unsigned>::to_u64();
    let validator_count = pre.validators.len();

    let post = altair::BeaconState {
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork: Fork {
            previous_version: pre.fork.current_version,
            current_version: C::altair_fork_version(),
            epoch,
        },
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,
        validators: pre.validators,
        balances: pre.balances,
        randao_mixes: pre.randao_mixes,
        slashings: pre.slashings,
        previous_epoch_participation: VariableList::from(vec![0; validator_count]),
        current_epoch_participation: VariableList::from(vec![0; validator_count]),
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,
        inactivity_scores: VariableList::from(vec![0; validator_count]),
        current_sync_committee: Default::default(),
        next_sync_committee: Default::default(),
    };

    let state = types::BeaconState::Altair(post);
    let committee = derive_next_sync_committee(&state)?;
    let mut post = match state {
        types::BeaconState::Altair(inner) => inner,
        _ => unreachable!(),
    };
    post.current_sync_committee = committee.clone();
    post.next_sync_committee = committee;

    Ok(post)
}

/// Carries an altair state across the merge fork boundary. The execution
/// payload header starts empty; it is first filled by the block that
/// completes the transition.
pub fn upgrade_to_merge<C: Config>(pre: altair::BeaconState<C>) -> merge::BeaconState<C> {
    let epoch = pre.slot / <C::SlotsPerEpoch as typenum::Unsigned>::to_u64();

    merge::BeaconState {
        genesis_time: pre.genesis_time,
        genesis_validators_root: pre.genesis_validators_root,
        slot: pre.slot,
        fork: Fork {
            previous_version: pre.fork.current_version,
            current_version: C::merge_fork_version(),
            epoch,
        },
        latest_block_header: pre.latest_block_header,
        block_roots: pre.block_roots,
        state_roots: pre.state_roots,
        historical_roots: pre.historical_roots,
        eth1_data: pre.eth1_data,
        eth1_data_votes: pre.eth1_data_votes,
        eth1_deposit_index: pre.eth1_deposit_index,
        validators: pre.validators,
        balances: pre.balances,
        randao_mixes: pre.randao_mixes,
        slashings: pre.slashings,
        previous_epoch_participation: pre.previous_epoch_participation,
        current_epoch_participation: pre.current_epoch_participation,
        justification_bits: pre.justification_bits,
        previous_justified_checkpoint: pre.previous_justified_checkpoint,
        current_justified_checkpoint: pre.current_justified_checkpoint,
        finalized_checkpoint: pre.finalized_checkpoint,
        inactivity_scores: pre.inactivity_scores,
        current_sync_committee: pre.current_sync_committee,
        next_sync_committee: pre.next_sync_committee,
        latest_execution_payload_header: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz::VariableList;
    use types::config::MinimalConfig;
    use types::types::Validator;

    fn phase0_state(validators: usize) -> phase0::BeaconState<MinimalConfig> {
        let validators: Vec<Validator> = (0..validators)
            .map(|_| Validator {
                effective_balance: 32_000_000_000,
                activation_epoch: 0,
                exit_epoch: u64::max_value(),
                withdrawable_epoch: u64::max_value(),
                ..Validator::default()
            })
            .collect();
        let balances: Vec<u64> = validators.iter().map(|v| v.effective_balance).collect();
        phase0::BeaconState {
            validators: VariableList::from(validators),
            balances: VariableList::from(balances),
            ..phase0::BeaconState::default()
        }
    }

    #[test]
    fn altair_upgrade_preserves_registry_parallelism() {
        let pre = phase0_state(8);
        let post = upgrade_to_altair(pre).expect("Test");

        assert_eq!(post.validators.len(), 8);
        assert_eq!(post.previous_epoch_participation.len(), 8);
        assert_eq!(post.current_epoch_participation.len(), 8);
        assert_eq!(post.inactivity_scores.len(), 8);
        assert_eq!(
            post.fork.current_version,
            MinimalConfig::altair_fork_version()
        );
        assert_eq!(post.current_sync_committee, post.next_sync_committee);
    }

    #[test]
    fn merge_upgrade_starts_with_empty_payload_header() {
        let pre = upgrade_to_altair(phase0_state(8)).expect("Test");
        let post = upgrade_to_merge(pre);

        assert!(post.latest_execution_payload_header.is_empty());
        assert_eq!(
            post.fork.current_version,
            MinimalConfig::merge_fork_version()
        );
        assert_eq!(
            post.fork.previous_version,
            MinimalConfig::altair_fork_version()
        );
    }
}
