use core::fmt;

use types::primitives::Slot;

/// A slot and a bit for whether block processing is included, packed so that
/// the natural integer order matches chain order. `block == false` is the
/// post-slot-processing, pre-block snapshot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Step(u64);

impl Step {
    pub fn new(slot: Slot, block: bool) -> Self {
        assert!(slot & (1 << 63) == 0, "slot overflow");
        Self((slot << 1) | u64::from(block))
    }

    pub fn slot(self) -> Slot {
        self.0 >> 1
    }

    pub fn block(self) -> bool {
        self.0 & 1 != 0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot(), u8::from(self.block()))
    }
}
