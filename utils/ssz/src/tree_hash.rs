use ethereum_types::H256;

use crate::merkle::{merkleize_chunks, pack_bytes};

pub const BYTES_PER_CHUNK: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TreeHashType {
    Basic,
    Vector,
    List,
    Container,
}

/// The 32-byte Merkle commitment of a typed value. A function only of the
/// logical value, never of its in-memory representation.
pub trait TreeHash {
    fn tree_hash_type() -> TreeHashType;

    /// The little-endian byte image used when values of this type are packed
    /// into chunks. Only meaningful for basic types.
    fn tree_hash_packed_encoding(&self) -> Vec<u8>;

    /// How many values of this type fit in one 32-byte chunk.
    fn tree_hash_packing_factor() -> usize;

    fn tree_hash_root(&self) -> H256;
}

macro_rules! tree_hash_for_uintn {
    ( $(($type_ident: ty, $size_in_bytes: expr)),* ) => { $(
        impl TreeHash for $type_ident {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Basic
            }

            fn tree_hash_packed_encoding(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn tree_hash_packing_factor() -> usize {
                BYTES_PER_CHUNK / $size_in_bytes
            }

            fn tree_hash_root(&self) -> H256 {
                let mut chunk = [0_u8; BYTES_PER_CHUNK];
                chunk[..$size_in_bytes].copy_from_slice(&self.to_le_bytes());
                H256::from(chunk)
            }
        }
    )* };
}

tree_hash_for_uintn!((u8, 1), (u16, 2), (u32, 4), (u64, 8));

impl TreeHash for bool {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Basic
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        (*self as u8).tree_hash_packed_encoding()
    }

    fn tree_hash_packing_factor() -> usize {
        <u8 as TreeHash>::tree_hash_packing_factor()
    }

    fn tree_hash_root(&self) -> H256 {
        (*self as u8).tree_hash_root()
    }
}

// Fixed byte arrays are vectors of bytes under the merkleisation rules.
macro_rules! tree_hash_for_u8_array {
    ($size: expr) => {
        impl TreeHash for [u8; $size] {
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
                let chunks = pack_bytes(&self[..]);
                merkleize_chunks(&chunks, ($size + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK)
            }
        }
    };
}

tree_hash_for_u8_array!(4);
tree_hash_for_u8_array!(20);
tree_hash_for_u8_array!(32);
tree_hash_for_u8_array!(48);
tree_hash_for_u8_array!(96);

impl TreeHash for H256 {
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
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::hash_concat;

    #[test]
    fn uint64_root_is_le_padded() {
        let mut expected = [0_u8; 32];
        expected[0] = 42;
        assert_eq!(42_u64.tree_hash_root(), H256::from(expected));
    }

    #[test]
    fn bool_root() {
        let mut expected = [0_u8; 32];
        expected[0] = 1;
        assert_eq!(true.tree_hash_root(), H256::from(expected));
        assert_eq!(false.tree_hash_root(), H256::zero());
    }

    #[test]
    fn h256_root_is_identity() {
        let value = H256::repeat_byte(0x5a);
        assert_eq!(value.tree_hash_root(), value);
    }

    #[test]
    fn array_48_spans_two_chunks() {
        let value = [0xff_u8; 48];
        let mut second = [0_u8; 32];
        second[..16].copy_from_slice(&[0xff; 16]);
        assert_eq!(
            value.tree_hash_root(),
            hash_concat(H256::repeat_byte(0xff), H256::from(second))
        );
    }

    #[test]
    fn array_96_spans_four_chunks() {
        let value = [1_u8; 96];
        let chunks = pack_bytes(&value);
        assert_eq!(value.tree_hash_root(), merkleize_chunks(&chunks, 3));
    }
}
