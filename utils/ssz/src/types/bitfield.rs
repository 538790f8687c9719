use core::marker::PhantomData;
use ethereum_types::H256;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::Unsigned;

use super::TypeError;
use crate::merkle::{merkleize_chunks, mix_in_length, pack_bytes};
use crate::tree_hash::{TreeHash, TreeHashType, BYTES_PER_CHUNK};
use crate::{SszDecode, SszDecodeError, SszEncode};

pub mod length {
    use core::marker::PhantomData;

    #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
    pub struct Variable<N> {
        _phantom: PhantomData<N>,
    }

    #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
    pub struct Fixed<N> {
        _phantom: PhantomData<N>,
    }
}

/// A bitlist with an explicit final sentinel bit on the wire.
pub type BitList<N> = Bitfield<length::Variable<N>>;

/// A bitvector whose length is fixed by the schema.
pub type BitVector<N> = Bitfield<length::Fixed<N>>;

/// Heap-allocated, little-endian ordered sequence of bits. Bit `i` lives in
/// byte `i / 8` at position `i % 8`. The sentinel bit of a bitlist is not part
/// of the stored bytes, it only appears in the wire image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Bitfield<T> {
    bytes: Vec<u8>,
    len: usize,
    _phantom: PhantomData<T>,
}

pub fn bytes_for_bit_len(bit_len: usize) -> usize {
    std::cmp::max(1, (bit_len + 7) / 8)
}

impl<N: Unsigned + Clone> BitList<N> {
    pub fn with_capacity(num_bits: usize) -> Result<Self, TypeError> {
        if num_bits <= N::to_usize() {
            Ok(Self {
                bytes: vec![0; bytes_for_bit_len(num_bits)],
                len: num_bits,
                _phantom: PhantomData,
            })
        } else {
            Err(TypeError::OutOfBounds {
                i: num_bits,
                len: N::to_usize(),
            })
        }
    }

    pub fn max_len() -> usize {
        N::to_usize()
    }

    /// Wire image with the sentinel bit appended after the last data bit.
    pub fn into_bytes(self) -> Vec<u8> {
        let len = self.len();
        let mut bytes = self.bytes;
        bytes.resize(bytes_for_bit_len(len + 1), 0);
        bytes[len / 8] |= 1 << (len % 8);
        bytes
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TypeError> {
        let bytes_len = bytes.len();
        let mut initial = Self::from_raw_bytes(bytes, bytes_len * 8)?;

        let sentinel = initial
            .highest_set_bit()
            .ok_or(TypeError::MissingLengthInformation)?;

        // The sentinel must live in the last byte, otherwise trailing zero
        // bytes would make distinct wire images decode to the same value.
        if bytes_for_bit_len(sentinel + 1) != bytes_len {
            return Err(TypeError::InvalidByteCount {
                given: bytes_len,
                expected: bytes_for_bit_len(sentinel + 1),
            });
        }
        if sentinel > N::to_usize() {
            return Err(TypeError::OutOfBounds {
                i: sentinel,
                len: N::to_usize(),
            });
        }

        initial.set(sentinel, false).expect("sentinel is in range");
        initial.bytes.truncate(bytes_for_bit_len(sentinel));
        initial.len = sentinel;
        Ok(initial)
    }

    /// Bitwise-or with another list of the same length.
    pub fn union(&self, other: &Self) -> Result<Self, TypeError> {
        if self.len() != other.len() {
            return Err(TypeError::OutOfBounds {
                i: other.len(),
                len: self.len(),
            });
        }
        let mut result = self.clone();
        for (byte, other_byte) in result.bytes.iter_mut().zip(other.bytes.iter()) {
            *byte |= other_byte;
        }
        Ok(result)
    }

    pub fn intersection(&self, other: &Self) -> Result<Self, TypeError> {
        if self.len() != other.len() {
            return Err(TypeError::OutOfBounds {
                i: other.len(),
                len: self.len(),
            });
        }
        let mut result = self.clone();
        for (byte, other_byte) in result.bytes.iter_mut().zip(other.bytes.iter()) {
            *byte &= other_byte;
        }
        Ok(result)
    }
}

impl<N: Unsigned + Clone> BitVector<N> {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; bytes_for_bit_len(N::to_usize())],
            len: N::to_usize(),
            _phantom: PhantomData,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TypeError> {
        let num_bits = N::to_usize();
        let bytes_len = bytes.len();
        if bytes_len != bytes_for_bit_len(num_bits) {
            return Err(TypeError::InvalidByteCount {
                given: bytes_len,
                expected: bytes_for_bit_len(num_bits),
            });
        }

        let result = Self::from_raw_bytes(bytes, bytes_len * 8)?;
        for i in num_bits..result.bytes.len() * 8 {
            if result.raw_get(i) {
                return Err(TypeError::ExcessBits);
            }
        }

        Ok(Self {
            bytes: result.bytes,
            len: num_bits,
            _phantom: PhantomData,
        })
    }
}

impl<N: Unsigned + Clone> Default for BitVector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Bitfield<T> {
    fn from_raw_bytes(bytes: Vec<u8>, len: usize) -> Result<Self, TypeError> {
        if bytes.is_empty() {
            return Err(TypeError::InvalidByteCount {
                given: 0,
                expected: 1,
            });
        }
        Ok(Self {
            bytes,
            len,
            _phantom: PhantomData,
        })
    }

    fn raw_get(&self, i: usize) -> bool {
        self.bytes[i / 8] & (1 << (i % 8)) != 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Result<bool, TypeError> {
        if i < self.len {
            Ok(self.raw_get(i))
        } else {
            Err(TypeError::OutOfBounds { i, len: self.len })
        }
    }

    pub fn set(&mut self, i: usize, value: bool) -> Result<(), TypeError> {
        if i < self.len {
            if value {
                self.bytes[i / 8] |= 1 << (i % 8);
            } else {
                self.bytes[i / 8] &= !(1 << (i % 8));
            }
            Ok(())
        } else {
            Err(TypeError::OutOfBounds { i, len: self.len })
        }
    }

    pub fn highest_set_bit(&self) -> Option<usize> {
        self.bytes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, byte)| **byte != 0)
            .map(|(i, byte)| i * 8 + 7 - byte.leading_zeros() as usize)
    }

    pub fn num_set_bits(&self) -> usize {
        self.bytes.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> BitIter<'_, T> {
        BitIter {
            bitfield: self,
            i: 0,
        }
    }

    fn data_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub struct BitIter<'a, T> {
    bitfield: &'a Bitfield<T>,
    i: usize,
}

impl<'a, T> Iterator for BitIter<'a, T> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let result = self.bitfield.get(self.i).ok()?;
        self.i += 1;
        Some(result)
    }
}

impl<N: Unsigned + Clone> SszEncode for Bitfield<length::Variable<N>> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.clone().into_bytes()
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        bytes_for_bit_len(self.len() + 1)
    }
}

impl<N: Unsigned + Clone> SszDecode for Bitfield<length::Variable<N>> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        Self::from_bytes(bytes.to_vec()).map_err(|e| match e {
            TypeError::OutOfBounds { i, len } => SszDecodeError::ListTooLong { len: i, max: len },
            other => {
                SszDecodeError::BytesInvalid(format!("failed while creating BitList: {:?}", other))
            }
        })
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }
}

impl<N: Unsigned + Clone> SszEncode for Bitfield<length::Fixed<N>> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.clone().into_bytes()
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_bytes_len(&self) -> usize {
        bytes_for_bit_len(N::to_usize())
    }

    fn ssz_fixed_len() -> usize {
        bytes_for_bit_len(N::to_usize())
    }
}

impl<N: Unsigned + Clone> SszDecode for Bitfield<length::Fixed<N>> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        Self::from_bytes(bytes.to_vec()).map_err(|e| {
            SszDecodeError::BytesInvalid(format!("failed while creating BitVector: {:?}", e))
        })
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        bytes_for_bit_len(N::to_usize())
    }
}

impl<N: Unsigned + Clone> TreeHash for Bitfield<length::Variable<N>> {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::List
    }

    fn tree_hash_packed_encoding(&self) -> Vec<u8> {
        unreachable!("lists are not packed")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("lists are not packed")
    }

    fn tree_hash_root(&self) -> H256 {
        let chunk_limit = (N::to_usize() + BYTES_PER_CHUNK * 8 - 1) / (BYTES_PER_CHUNK * 8);
        let root = merkleize_chunks(&pack_bytes(self.data_bytes()), chunk_limit);
        mix_in_length(root, self.len)
    }
}

impl<N: Unsigned + Clone> TreeHash for Bitfield<length::Fixed<N>> {
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
        let chunk_limit = (N::to_usize() + BYTES_PER_CHUNK * 8 - 1) / (BYTES_PER_CHUNK * 8);
        merkleize_chunks(&pack_bytes(self.data_bytes()), chunk_limit.max(1))
    }
}

// YAML test files represent bitfields as "0x…" strings of the wire image.
impl<T: Clone> Serialize for Bitfield<T>
where
    Self: SszEncode,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.as_ssz_bytes())))
    }
}

impl<'de, T: Clone> Deserialize<'de> for Bitfield<T>
where
    Self: SszDecode,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        let stripped = string.trim_start_matches("0x");
        let bytes = hex::decode(stripped).map_err(D::Error::custom)?;
        Self::from_ssz_bytes(&bytes).map_err(|e| D::Error::custom(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typenum::{U0, U1, U16, U8};

    mod bitlist {
        use super::*;

        type BitList0 = BitList<U0>;
        type BitList1 = BitList<U1>;
        type BitList8 = BitList<U8>;
        type BitList16 = BitList<U16>;

        #[test]
        fn encode() {
            assert_eq!(
                BitList0::with_capacity(0).expect("Test").as_ssz_bytes(),
                vec![0b0000_0001],
            );

            assert_eq!(
                BitList1::with_capacity(1).expect("Test").as_ssz_bytes(),
                vec![0b0000_0010],
            );

            assert_eq!(
                BitList8::with_capacity(8).expect("Test").as_ssz_bytes(),
                vec![0b0000_0000, 0b0000_0001],
            );

            assert_eq!(
                BitList8::with_capacity(7).expect("Test").as_ssz_bytes(),
                vec![0b1000_0000]
            );

            let mut b = BitList8::with_capacity(8).expect("Test");
            for i in 0..8 {
                b.set(i, true).expect("Test");
            }
            assert_eq!(b.as_ssz_bytes(), vec![255, 0b0000_0001]);
        }

        #[test]
        fn decode() {
            assert!(BitList0::from_ssz_bytes(&[]).is_err());
            assert!(BitList8::from_ssz_bytes(&[0b0000_0000]).is_err());

            assert!(BitList0::from_ssz_bytes(&[0b0000_0001]).is_ok());
            assert!(BitList0::from_ssz_bytes(&[0b0000_0010]).is_err());

            assert!(BitList1::from_ssz_bytes(&[0b0000_0001]).is_ok());
            assert!(BitList1::from_ssz_bytes(&[0b0000_0010]).is_ok());
            assert!(BitList1::from_ssz_bytes(&[0b0000_0100]).is_err());

            assert!(BitList8::from_ssz_bytes(&[0b0000_0001, 0b0000_0001]).is_ok());
            assert!(BitList8::from_ssz_bytes(&[0b0000_0001, 0b0000_0010]).is_err());
        }

        #[test]
        fn decode_extra_bytes() {
            assert!(BitList0::from_ssz_bytes(&[0b0000_0001, 0b0000_0000]).is_err());
            assert!(BitList8::from_ssz_bytes(&[0b0000_0001, 0b0000_0000]).is_err());
        }

        #[test]
        fn round_trip() {
            for i in 0..9 {
                let mut b = BitList8::with_capacity(i).expect("Test");
                for j in (0..i).step_by(2) {
                    b.set(j, true).expect("Test");
                }
                assert_eq!(
                    BitList8::from_ssz_bytes(&b.as_ssz_bytes()).expect("Test"),
                    b
                );
            }
        }

        #[test]
        fn union_and_intersection() {
            let mut a = BitList8::with_capacity(4).expect("Test");
            let mut b = BitList8::with_capacity(4).expect("Test");
            a.set(0, true).expect("Test");
            a.set(1, true).expect("Test");
            b.set(1, true).expect("Test");
            b.set(2, true).expect("Test");

            let union = a.union(&b).expect("Test");
            assert_eq!(union.num_set_bits(), 3);

            let intersection = a.intersection(&b).expect("Test");
            assert_eq!(intersection.num_set_bits(), 1);
            assert!(intersection.get(1).expect("Test"));
        }

        #[test]
        fn over_capacity() {
            assert_eq!(
                BitList8::with_capacity(9),
                Err(TypeError::OutOfBounds { i: 9, len: 8 })
            );
        }
    }

    mod bitvector {
        use super::*;

        type BitVector0 = BitVector<U0>;
        type BitVector1 = BitVector<U1>;
        type BitVector8 = BitVector<U8>;
        type BitVector16 = BitVector<U16>;

        #[test]
        fn encode() {
            assert_eq!(BitVector0::new().as_ssz_bytes(), vec![0b0000_0000]);
            assert_eq!(BitVector8::new().as_ssz_bytes(), vec![0b0000_0000]);
            assert_eq!(
                BitVector16::new().as_ssz_bytes(),
                vec![0b0000_0000, 0b0000_0000]
            );

            let mut b = BitVector8::new();
            for i in 0..8 {
                b.set(i, true).expect("Test");
            }
            assert_eq!(b.as_ssz_bytes(), vec![255]);
        }

        #[test]
        fn decode() {
            assert!(BitVector0::from_ssz_bytes(&[0b0000_0000]).is_ok());
            assert!(BitVector0::from_ssz_bytes(&[0b0000_0001]).is_err());

            assert!(BitVector1::from_ssz_bytes(&[0b0000_0001]).is_ok());
            assert!(BitVector1::from_ssz_bytes(&[0b0000_0010]).is_err());
            assert!(BitVector1::from_ssz_bytes(&[0b0000_0000, 0b0000_0000]).is_err());

            assert!(BitVector8::from_ssz_bytes(&[0b0000_0010]).is_ok());
            assert!(BitVector16::from_ssz_bytes(&[0b0000_0000]).is_err());
        }

        #[test]
        fn round_trip() {
            let mut b = BitVector16::new();
            for j in (0..16).step_by(3) {
                b.set(j, true).expect("Test");
            }
            assert_eq!(
                BitVector16::from_ssz_bytes(&b.as_ssz_bytes()).expect("Test"),
                b
            );
        }
    }
}
