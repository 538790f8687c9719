use ethereum_types::H256;
use thiserror::Error;

use crate::step::Step;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("no entry for block root {0:?}")]
    UnknownBlock(H256),
    #[error("no entry for state root {0:?}")]
    UnknownState(H256),
    #[error("ancestor {0:?} is not part of the chain")]
    UnknownAncestor(H256),
    #[error("cold chain ends at {end} but {appended} was appended")]
    FinalityRegression { end: Step, appended: Step },
}
