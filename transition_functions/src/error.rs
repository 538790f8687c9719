use thiserror::Error;

use types::cancel::Cancelled;
use types::config::ForkName;
use types::primitives::Slot;

/// Validation failures of the state-transition function. Any of these leaves
/// the caller's observable state untouched: transitions run on a working copy
/// that is only swapped in on success.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("target slot {target} is behind the state slot {state_slot}")]
    SlotRegression { state_slot: Slot, target: Slot },
    #[error("block fork {block:?} does not match state fork {state:?}")]
    ForkMismatch { state: ForkName, block: ForkName },
    #[error("bad block header: {0}")]
    BadHeader(&'static str),
    #[error("bad randao reveal")]
    BadRandao,
    #[error("bad eth1 vote: {0}")]
    BadEth1Vote(&'static str),
    #[error("bad attestation: {0}")]
    BadAttestation(&'static str),
    #[error("bad deposit: {0}")]
    BadDeposit(&'static str),
    #[error("bad voluntary exit: {0}")]
    BadExit(&'static str),
    #[error("bad slashing: {0}")]
    BadSlashing(&'static str),
    #[error("bad sync aggregate: {0}")]
    BadSyncAggregate(&'static str),
    #[error("bad execution payload: {0}")]
    BadExecutionPayload(&'static str),
    #[error("invalid signature under the {domain} domain")]
    BadSignature { domain: &'static str },
    #[error("{kind} count {count} exceeds the limit {limit}")]
    BodyLimit {
        kind: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("post-state root does not match the root claimed by the block")]
    StateRootMismatch,
    #[error("not enough validators to start a chain")]
    InvalidGenesis,
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Helper(#[from] helper_functions::Error),
}

impl From<Cancelled> for Error {
    fn from(_: Cancelled) -> Self {
        Error::Cancelled
    }
}

impl From<epoch_context::Error> for Error {
    fn from(error: epoch_context::Error) -> Self {
        match error {
            epoch_context::Error::Helper(helper) => Error::Helper(helper),
            _ => Error::BadHeader("slot outside the epoch context"),
        }
    }
}
