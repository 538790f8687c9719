use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    /// The requested slot is outside the ring-buffer window.
    #[error("slot is not in the stored root window")]
    RootOutOfRange,
    #[error("index out of range")]
    IndexOutOfRange,
    #[error("aggregation bits do not match the committee size")]
    AttestationBitsInvalid,
    #[error("more attesting indices than the committee bound")]
    MaxIndicesExceeded,
    #[error("attesting indices are not sorted and unique")]
    BadValidatorIndicesOrdering,
    #[error("attesting indices are empty")]
    NoAttestingIndices,
    #[error("validator exit already initiated")]
    ValidatorExitAlreadyInitiated,
    #[error("no active validators at the requested epoch")]
    NoActiveValidators,
    #[error("committee index is out of range for the slot")]
    CommitteeIndexOutOfRange,
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error("state is from the wrong fork for this operation")]
    WrongFork,
}
