use core::marker::PhantomData;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::slice::SliceIndex;
use ethereum_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::Unsigned;

use super::TypeError;
use crate::merkle::{merkleize_chunks, pack_bytes};
use crate::tree_hash::{TreeHash, TreeHashType, BYTES_PER_CHUNK};
use crate::{
    decode_variable_sized_items, encode_offset, SszDecode, SszDecodeError, SszEncode,
    BYTES_PER_LENGTH_OFFSET,
};

/// A homogeneous collection whose length is fixed by the schema at `N`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedVector<T, N> {
    vec: Vec<T>,
    _phantom: PhantomData<N>,
}

impl<T, N: Unsigned> FixedVector<T, N> {
    pub fn new(vec: Vec<T>) -> Result<Self, TypeError> {
        if vec.len() == N::to_usize() {
            Ok(Self {
                vec,
                _phantom: PhantomData,
            })
        } else {
            Err(TypeError::OutOfBounds {
                i: vec.len(),
                len: N::to_usize(),
            })
        }
    }

    pub fn capacity() -> usize {
        N::to_usize()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.vec.clone()
    }
}

/// Truncates or pads with defaults to exactly `N` elements.
impl<T: Default + Clone, N: Unsigned> From<Vec<T>> for FixedVector<T, N> {
    fn from(mut vec: Vec<T>) -> Self {
        vec.resize(N::to_usize(), T::default());
        Self {
            vec,
            _phantom: PhantomData,
        }
    }
}

impl<T: Default + Clone, N: Unsigned> Default for FixedVector<T, N> {
    fn default() -> Self {
        Self::from(vec![])
    }
}

impl<T, N: Unsigned> From<FixedVector<T, N>> for Vec<T> {
    fn from(vector: FixedVector<T, N>) -> Vec<T> {
        vector.vec
    }
}

impl<T, N: Unsigned, I: SliceIndex<[T]>> Index<I> for FixedVector<T, N> {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        Index::index(&self.vec, index)
    }
}

impl<T, N: Unsigned, I: SliceIndex<[T]>> IndexMut<I> for FixedVector<T, N> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(&mut self.vec, index)
    }
}

impl<T, N: Unsigned> Deref for FixedVector<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.vec[..]
    }
}

impl<T, N: Unsigned> DerefMut for FixedVector<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.vec[..]
    }
}

impl<T: SszEncode, N: Unsigned> SszEncode for FixedVector<T, N> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        let mut result = vec![];

        if T::is_ssz_fixed_len() {
            for element in self.iter() {
                result.append(&mut element.as_ssz_bytes());
            }
        } else {
            let mut variable_parts = Vec::with_capacity(self.len());
            for element in self.iter() {
                variable_parts.push(element.as_ssz_bytes())
            }

            let fixed_length = self.len() * BYTES_PER_LENGTH_OFFSET;
            let variable_lengths: Vec<usize> =
                variable_parts.iter().map(std::vec::Vec::len).collect();

            for i in 0..self.len() {
                let variable_length_sum: usize = variable_lengths[..i].iter().sum();
                result.extend(encode_offset(fixed_length + variable_length_sum));
            }

            for part in variable_parts {
                result.extend(part);
            }
        }

        result
    }

    fn is_ssz_fixed_len() -> bool {
        <T as SszEncode>::is_ssz_fixed_len()
    }

    fn ssz_bytes_len(&self) -> usize {
        if T::is_ssz_fixed_len() {
            N::to_usize() * T::ssz_fixed_len()
        } else {
            self.len() * BYTES_PER_LENGTH_OFFSET
                + self.iter().map(SszEncode::ssz_bytes_len).sum::<usize>()
        }
    }

    fn ssz_fixed_len() -> usize {
        if <Self as SszEncode>::is_ssz_fixed_len() {
            N::to_usize() * T::ssz_fixed_len()
        } else {
            BYTES_PER_LENGTH_OFFSET
        }
    }
}

impl<T: SszDecode, N: Unsigned> SszDecode for FixedVector<T, N> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        let items_count = N::to_usize();

        if <T as SszDecode>::is_ssz_fixed_len() {
            let expected = items_count * T::ssz_fixed_len();
            if bytes.len() != expected {
                return Err(SszDecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected,
                });
            }

            let mut result = Vec::with_capacity(items_count);
            for chunk in bytes.chunks(T::ssz_fixed_len()) {
                result.push(T::from_ssz_bytes(chunk)?);
            }

            Self::new(result)
                .map_err(|e| SszDecodeError::BytesInvalid(format!("wrong length: {:?}", e)))
        } else {
            let items = decode_variable_sized_items(bytes)?;

            Self::new(items).map_err(|e| {
                SszDecodeError::BytesInvalid(format!(
                    "cannot parse FixedVector[{}]: {:?}",
                    items_count, e
                ))
            })
        }
    }

    fn is_ssz_fixed_len() -> bool {
        <T as SszDecode>::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        if <Self as SszDecode>::is_ssz_fixed_len() {
            N::to_usize() * T::ssz_fixed_len()
        } else {
            BYTES_PER_LENGTH_OFFSET
        }
    }
}

impl<T: TreeHash, N: Unsigned> TreeHash for FixedVector<T, N> {
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
        match T::tree_hash_type() {
            TreeHashType::Basic => {
                let mut packed = Vec::with_capacity(self.len() * BYTES_PER_CHUNK);
                for element in self.iter() {
                    packed.append(&mut element.tree_hash_packed_encoding());
                }
                let chunk_limit =
                    (N::to_usize() + T::tree_hash_packing_factor() - 1) / T::tree_hash_packing_factor();
                merkleize_chunks(&pack_bytes(&packed), chunk_limit)
            }
            _ => {
                let roots: Vec<H256> = self.iter().map(TreeHash::tree_hash_root).collect();
                merkleize_chunks(&roots, N::to_usize())
            }
        }
    }
}

impl<T: Serialize, N: Unsigned> Serialize for FixedVector<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.vec.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Default + Clone, N: Unsigned> Deserialize<'de>
    for FixedVector<T, N>
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let vec = <Vec<T>>::deserialize(deserializer)?;
        Ok(Self::from(vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typenum::{U3, U5, U6};

    #[test]
    fn new_exact_length() {
        assert!(<FixedVector<u16, U3>>::new(vec![1, 2, 3]).is_ok());
        assert!(<FixedVector<u16, U3>>::new(vec![1, 2]).is_err());
    }

    #[test]
    fn from_pads_and_truncates() {
        let vector: FixedVector<u16, U3> = vec![1, 2, 3, 4].into();
        assert_eq!(vector.to_vec(), vec![1, 2, 3]);

        let vector: FixedVector<u16, U3> = vec![1].into();
        assert_eq!(vector.to_vec(), vec![1, 0, 0]);
    }

    #[test]
    fn serialize_fixed() {
        let vec: FixedVector<u16, U3> = FixedVector::from(vec![1, 2, 3]);
        assert_eq!(vec.as_ssz_bytes(), vec![1, 0, 2, 0, 3, 0]);
        let vec: FixedVector<u16, U5> = FixedVector::from(vec![1, 2, 3]);
        assert_eq!(vec.as_ssz_bytes(), vec![1, 0, 2, 0, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn serialize_variable() {
        let vec: FixedVector<Vec<u8>, U3> = FixedVector::from(vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(
            vec.as_ssz_bytes(),
            vec![12, 0, 0, 0, 14, 0, 0, 0, 14, 0, 0, 0, 1, 2, 3]
        );
    }

    #[test]
    fn deserialize_fixed() {
        let vec =
            <FixedVector<u16, U3> as SszDecode>::from_ssz_bytes(&[5, 0, 2, 0, 3, 0]).expect("Test");
        assert_eq!(vec.to_vec(), vec![5, 2, 3]);

        assert!(<FixedVector<u8, U6> as SszDecode>::from_ssz_bytes(&[1, 2, 3, 4]).is_err());
        assert!(
            <FixedVector<u8, U6> as SszDecode>::from_ssz_bytes(&[1, 2, 3, 4, 5, 6, 7]).is_err()
        );
    }

    #[test]
    fn deserialize_variable() {
        let vec = <FixedVector<Vec<u8>, U3> as SszDecode>::from_ssz_bytes(&[
            12, 0, 0, 0, 14, 0, 0, 0, 14, 0, 0, 0, 1, 2, 3,
        ])
        .expect("Test");

        assert_eq!(vec.to_vec(), vec![vec![1, 2], vec![], vec![3]]);
    }

    #[test]
    fn tree_hash_packed() {
        // Two u64 values pack into a single chunk; four chunks in the tree.
        let vec: FixedVector<u64, U5> = FixedVector::from(vec![1, 2, 3, 4, 5]);
        let mut packed = vec![];
        for value in vec.iter() {
            packed.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(
            vec.tree_hash_root(),
            merkleize_chunks(&pack_bytes(&packed), 2)
        );
    }
}
