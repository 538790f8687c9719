use ethereum_types::H256;
use ssz::{SszDecode, SszDecodeError, SszEncode};

use crate::config::{Config, ForkName};
use crate::primitives::*;
use crate::types::BeaconBlockHeader;
use crate::{altair, merge, phase0};

/// A signed beacon block at any supported fork.
#[allow(clippy::large_enum_variant)]
#[derive(Clone, PartialEq, Debug)]
pub enum SignedBeaconBlock<C: Config> {
    Phase0(phase0::SignedBeaconBlock<C>),
    Altair(altair::SignedBeaconBlock<C>),
    Merge(merge::SignedBeaconBlock<C>),
}

macro_rules! message_accessor {
    ($name: ident, $type: ty) => {
        pub fn $name(&self) -> $type {
            match self {
                Self::Phase0(block) => block.message.$name,
                Self::Altair(block) => block.message.$name,
                Self::Merge(block) => block.message.$name,
            }
        }
    };
}

impl<C: Config> SignedBeaconBlock<C> {
    message_accessor!(slot, Slot);
    message_accessor!(proposer_index, ValidatorIndex);
    message_accessor!(parent_root, H256);
    message_accessor!(state_root, H256);

    pub fn signature(&self) -> &SignatureBytes {
        match self {
            Self::Phase0(block) => &block.signature,
            Self::Altair(block) => &block.signature,
            Self::Merge(block) => &block.signature,
        }
    }

    pub fn fork_name(&self) -> ForkName {
        match self {
            Self::Phase0(_) => ForkName::Phase0,
            Self::Altair(_) => ForkName::Altair,
            Self::Merge(_) => ForkName::Merge,
        }
    }

    /// `hash_tree_root` of the inner block, i.e. the block root.
    pub fn message_root(&self) -> H256 {
        match self {
            Self::Phase0(block) => ssz::TreeHash::tree_hash_root(&block.message),
            Self::Altair(block) => ssz::TreeHash::tree_hash_root(&block.message),
            Self::Merge(block) => ssz::TreeHash::tree_hash_root(&block.message),
        }
    }

    pub fn temporary_header(&self) -> BeaconBlockHeader {
        match self {
            Self::Phase0(block) => block.message.temporary_header(),
            Self::Altair(block) => block.message.temporary_header(),
            Self::Merge(block) => block.message.temporary_header(),
        }
    }

    pub fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            Self::Phase0(block) => block.as_ssz_bytes(),
            Self::Altair(block) => block.as_ssz_bytes(),
            Self::Merge(block) => block.as_ssz_bytes(),
        }
    }

    pub fn from_ssz_bytes(bytes: &[u8], fork: ForkName) -> Result<Self, SszDecodeError> {
        match fork {
            ForkName::Phase0 => {
                phase0::SignedBeaconBlock::from_ssz_bytes(bytes).map(Self::Phase0)
            }
            ForkName::Altair => {
                altair::SignedBeaconBlock::from_ssz_bytes(bytes).map(Self::Altair)
            }
            ForkName::Merge => merge::SignedBeaconBlock::from_ssz_bytes(bytes).map(Self::Merge),
        }
    }
}
