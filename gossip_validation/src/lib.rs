//! Pure classification of inbound gossip objects against the chain store:
//! ACCEPT for propagation, IGNORE for silent drops (possibly retried by the
//! caller), REJECT for provable invalidity that should penalise the peer.

mod aggregate;
mod block;
mod outcome;

pub use aggregate::{validate_aggregate_and_proof, validate_attestation};
pub use block::validate_block;
pub use outcome::{GossipBackend, Outcome};

use std::time::Duration;

use types::primitives::Slot;

/// How far behind its slot an attestation may still propagate.
pub const ATTESTATION_PROPAGATION_SLOT_RANGE: Slot = 32;

/// Clock skew tolerated between peers, expressed in slots for simplicity;
/// sub-slot disparity rounds up to one slot.
pub const MAXIMUM_GOSSIP_CLOCK_DISPARITY_SLOTS: Slot = 1;

/// Deadline for catch-up slot processing during validation. On expiry the
/// object is IGNOREd, never REJECTed.
pub const CATCHUP_TIMEOUT: Duration = Duration::from_secs(2);
