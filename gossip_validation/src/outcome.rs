use core::fmt;
use std::time::Duration;

use ethereum_types::H256;

use beacon_chain::HotColdChain;
use types::cancel::Cancellation;
use types::config::{Config, ForkSchedule};
use types::primitives::{Epoch, Slot, ValidatorIndex};
use types::BeaconState;

/// The three-way gossipsub verdict. Defaults to rejection so that a missed
/// case penalises rather than propagates.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Reject(&'static str),
    Ignore(&'static str),
    Accept,
}

impl Outcome {
    pub fn is_accept(&self) -> bool {
        *self == Outcome::Accept
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reject(reason) => write!(f, "REJECT: {}", reason),
            Outcome::Ignore(reason) => write!(f, "IGNORE: {}", reason),
            Outcome::Accept => write!(f, "ACCEPT"),
        }
    }
}

/// Everything a validator predicate needs from its environment. The chain
/// store supplies history; the rest is clock and seen-cache state owned by
/// the network stack.
pub trait GossipBackend<C: Config> {
    fn chain(&self) -> &HotColdChain<C>;

    fn fork_schedule(&self) -> ForkSchedule;

    /// The wall-clock slot, clipped at genesis.
    fn current_slot(&self) -> Slot;

    /// Whether votes for this block must be rejected outright.
    fn is_bad_block(&self, _root: H256) -> bool {
        false
    }

    /// Whether this aggregate (by `hash_tree_root`) has been seen via
    /// gossip, within a block, or through local aggregation.
    fn seen_aggregate(&self, _root: H256) -> bool {
        false
    }

    /// Whether this aggregator already produced an aggregate this epoch.
    fn seen_aggregator(&self, _target_epoch: Epoch, _aggregator: ValidatorIndex) -> bool {
        false
    }

    /// Whether a proposal by this proposer at this slot was already seen.
    fn seen_block_proposal(&self, _slot: Slot, _proposer: ValidatorIndex) -> bool {
        false
    }
}

/// Replays empty slots on a copy of `state` up to `slot`, bounded by a
/// deadline. Expiry surfaces as `Err(Ignore)`, matching the rule that slow
/// validation never penalises a peer.
pub fn catchup_state<C: Config>(
    state: &BeaconState<C>,
    slot: Slot,
    schedule: &ForkSchedule,
    deadline: Duration,
) -> Result<BeaconState<C>, Outcome> {
    if state.slot() >= slot {
        return Ok(state.clone());
    }

    let cancellation = Cancellation::new();
    let watchdog = cancellation.clone();
    let timer = std::thread::spawn(move || {
        std::thread::sleep(deadline);
        watchdog.cancel();
    });

    let mut copy = state.clone();
    let result = transition_functions::process_slots(&mut copy, slot, schedule, &cancellation);
    cancellation.cancel();
    drop(timer);

    match result {
        Ok(()) => Ok(copy),
        Err(transition_functions::Error::Cancelled) => {
            Err(Outcome::Ignore("validation deadline expired"))
        }
        Err(_) => Err(Outcome::Reject("target state cannot be reached")),
    }
}

/// Shared helper: the state of the chain entry for `block_root`, advanced to
/// `slot` under the catch-up deadline.
pub fn state_towards<C: Config>(
    chain: &HotColdChain<C>,
    block_root: H256,
    slot: Slot,
    schedule: &ForkSchedule,
    deadline: Duration,
) -> Result<BeaconState<C>, Outcome> {
    let entry = chain
        .closest(block_root, slot)
        .ok_or(Outcome::Ignore("unknown block root"))?;
    catchup_state(&entry.state(), slot, schedule, deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use types::config::MinimalConfig;
    use types::phase0;

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::Accept.to_string(), "ACCEPT");
        assert_eq!(Outcome::Ignore("x").to_string(), "IGNORE: x");
        assert_eq!(Outcome::Reject("y").to_string(), "REJECT: y");
    }

    #[test]
    fn catchup_is_a_no_op_for_reached_slots() {
        let state: BeaconState<MinimalConfig> =
            BeaconState::Phase0(phase0::BeaconState {
                slot: 5,
                ..phase0::BeaconState::default()
            });

        let caught_up = catchup_state(
            &state,
            3,
            &ForkSchedule::default(),
            Duration::from_secs(1),
        )
        .expect("Test");
        assert_eq!(caught_up.slot(), 5);
    }

    #[test]
    fn expired_deadline_is_an_ignore() {
        let state: BeaconState<MinimalConfig> =
            BeaconState::Phase0(phase0::BeaconState::default());

        // A zero deadline cancels before the first slot is processed.
        let result = catchup_state(
            &state,
            64,
            &ForkSchedule::default(),
            Duration::from_millis(0),
        );
        match result {
            Err(Outcome::Ignore(_)) => {}
            Ok(state) => assert_eq!(state.slot(), 64),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
