use core::fmt;
use ethereum_types::H256;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssz::{SszDecode, SszDecodeError, SszEncode, TreeHash, TreeHashType};

pub const PUBLIC_KEY_BYTES_LEN: usize = 48;
pub const SIGNATURE_BYTES_LEN: usize = 96;

macro_rules! bytes_struct {
    ($name: ident, $byte_size: expr, $kind: expr) => {
        /// A compressed curve point, carried as raw bytes and only
        /// interpreted by the verification backend.
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $byte_size]);

        impl $name {
            pub fn empty() -> Self {
                Self([0; $byte_size])
            }

            pub fn as_bytes(&self) -> &[u8; $byte_size] {
                &self.0
            }

            pub fn from_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
                if bytes.len() == $byte_size {
                    let mut array = [0; $byte_size];
                    array.copy_from_slice(bytes);
                    Ok(Self(array))
                } else {
                    Err(SszDecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: $byte_size,
                    })
                }
            }

            pub fn is_empty(&self) -> bool {
                self.0.iter().all(|byte| *byte == 0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($kind, "(0x{})"), hex::encode(&self.0[..]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(&self.0[..]))
            }
        }

        impl SszEncode for $name {
            fn as_ssz_bytes(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_bytes_len(&self) -> usize {
                $byte_size
            }

            fn ssz_fixed_len() -> usize {
                $byte_size
            }
        }

        impl SszDecode for $name {
            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
                Self::from_bytes(bytes)
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $byte_size
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
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

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&format!("0x{}", hex::encode(&self.0[..])))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let string = String::deserialize(deserializer)?;
                let bytes =
                    hex::decode(string.trim_start_matches("0x")).map_err(D::Error::custom)?;
                Self::from_bytes(&bytes).map_err(|e| D::Error::custom(format!("{:?}", e)))
            }
        }
    };
}

bytes_struct!(PublicKeyBytes, PUBLIC_KEY_BYTES_LEN, "PublicKeyBytes");
bytes_struct!(SignatureBytes, SIGNATURE_BYTES_LEN, "SignatureBytes");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_all_zeroes() {
        assert!(PublicKeyBytes::empty().is_empty());
        assert!(SignatureBytes::empty().is_empty());
    }

    #[test]
    fn ssz_round_trip() {
        let mut bytes = [0_u8; PUBLIC_KEY_BYTES_LEN];
        bytes[0] = 0xc0;
        bytes[47] = 0x7f;
        let pubkey = PublicKeyBytes(bytes);

        assert_eq!(
            PublicKeyBytes::from_ssz_bytes(&pubkey.as_ssz_bytes()).expect("Test"),
            pubkey
        );
        assert!(PublicKeyBytes::from_ssz_bytes(&[0; 47]).is_err());
    }

    #[test]
    fn signature_fixed_len() {
        assert_eq!(
            <SignatureBytes as SszDecode>::ssz_fixed_len(),
            SIGNATURE_BYTES_LEN
        );
    }
}
