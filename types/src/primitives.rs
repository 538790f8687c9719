use core::fmt;
use core::ops::Index;

use ethereum_types::H256;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{SszDecode, SszDecodeError, SszEncode, TreeHash, TreeHashType};

pub use bls::{PublicKeyBytes, SignatureBytes};
pub use ethereum_types::H256 as Hash256;

pub type AggregateSignatureBytes = SignatureBytes;
pub type Epoch = u64;
pub type Gwei = u64;
pub type Slot = u64;
pub type CommitteeIndex = u64;
pub type ValidatorIndex = u64;
pub type UnixSeconds = u64;

/// Mixed into a signing domain to separate message kinds.
pub type DomainType = [u8; 4];

/// `DomainType ∥ ForkDataRoot[0..28]`.
pub type Domain = H256;

type VersionAsArray = [u8; 4];

/// Fork identifier. The YAML test files represent it as a "0x…" string, so
/// serde goes through hex rather than an array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version(VersionAsArray);

impl Version {
    pub fn as_array(&self) -> &VersionAsArray {
        &self.0
    }
}

impl From<VersionAsArray> for Version {
    fn from(array: VersionAsArray) -> Self {
        Self(array)
    }
}

impl From<Version> for VersionAsArray {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl Index<usize> for Version {
    type Output = u8;

    fn index(&self, index: usize) -> &Self::Output {
        self.0.index(index)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl SszDecode for Version {
    fn is_ssz_fixed_len() -> bool {
        <VersionAsArray as SszDecode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <VersionAsArray as SszDecode>::ssz_fixed_len()
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        VersionAsArray::from_ssz_bytes(bytes).map(Self::from)
    }
}

impl SszEncode for Version {
    fn is_ssz_fixed_len() -> bool {
        <VersionAsArray as SszEncode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <VersionAsArray as SszEncode>::ssz_fixed_len()
    }

    fn ssz_bytes_len(&self) -> usize {
        4
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.0.as_ssz_bytes()
    }
}

impl TreeHash for Version {
    fn tree_hash_type() -> TreeHashType {
        VersionAsArray::tree_hash_type()
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_root(&self) -> H256 {
        self.0.tree_hash_root()
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let bytes = hex::decode(string.trim_start_matches("0x")).map_err(D::Error::custom)?;
        if bytes.len() != 4 {
            return Err(D::Error::custom(format!(
                "version must be 4 bytes, got {}",
                bytes.len()
            )));
        }
        let mut array = [0; 4];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

type AddressAsArray = [u8; 20];

/// An Eth1 execution-layer address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExecutionAddress(AddressAsArray);

impl ExecutionAddress {
    pub fn as_array(&self) -> &AddressAsArray {
        &self.0
    }
}

impl From<AddressAsArray> for ExecutionAddress {
    fn from(array: AddressAsArray) -> Self {
        Self(array)
    }
}

impl fmt::Debug for ExecutionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExecutionAddress(0x{})", hex::encode(self.0))
    }
}

impl SszDecode for ExecutionAddress {
    fn is_ssz_fixed_len() -> bool {
        <AddressAsArray as SszDecode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <AddressAsArray as SszDecode>::ssz_fixed_len()
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        AddressAsArray::from_ssz_bytes(bytes).map(Self::from)
    }
}

impl SszEncode for ExecutionAddress {
    fn is_ssz_fixed_len() -> bool {
        <AddressAsArray as SszEncode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        <AddressAsArray as SszEncode>::ssz_fixed_len()
    }

    fn ssz_bytes_len(&self) -> usize {
        20
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.0.as_ssz_bytes()
    }
}

impl TreeHash for ExecutionAddress {
    fn tree_hash_type() -> TreeHashType {
        AddressAsArray::tree_hash_type()
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("vectors are not packed")
    }

    fn tree_hash_root(&self) -> H256 {
        self.0.tree_hash_root()
    }
}

impl Serialize for ExecutionAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for ExecutionAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let bytes = hex::decode(string.trim_start_matches("0x")).map_err(D::Error::custom)?;
        if bytes.len() != 20 {
            return Err(D::Error::custom(format!(
                "address must be 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut array = [0; 20];
        array.copy_from_slice(&bytes);
        Ok(Self(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_round_trip() {
        let version = Version::from([1, 2, 3, 4]);
        assert_eq!(
            Version::from_ssz_bytes(&version.as_ssz_bytes()).expect("Test"),
            version
        );
        assert_eq!(version.to_string(), "0x01020304");
    }

    #[test]
    fn execution_address_length_enforced() {
        assert!(ExecutionAddress::from_ssz_bytes(&[0; 19]).is_err());
        assert!(ExecutionAddress::from_ssz_bytes(&[0; 20]).is_ok());
    }
}
