use core::marker::PhantomData;
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::slice::SliceIndex;
use ethereum_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typenum::Unsigned;

use super::TypeError;
use crate::merkle::{merkleize_chunks, mix_in_length, pack_bytes};
use crate::tree_hash::{TreeHash, TreeHashType, BYTES_PER_CHUNK};
use crate::{SszDecode, SszDecodeError, SszEncode};

/// A homogeneous collection bounded by the schema at a maximum of `N`
/// elements. The bound never appears on the wire, only in the Merkle tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableList<T, N> {
    vec: Vec<T>,
    _phantom: PhantomData<N>,
}

impl<T, N: Unsigned> VariableList<T, N> {
    pub fn new(vec: Vec<T>) -> Result<Self, TypeError> {
        if vec.len() <= N::to_usize() {
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

    pub fn empty() -> Self {
        Self {
            vec: vec![],
            _phantom: PhantomData,
        }
    }

    pub fn max_len() -> usize {
        N::to_usize()
    }

    pub fn push(&mut self, value: T) -> Result<(), TypeError> {
        if self.vec.len() < N::to_usize() {
            self.vec.push(value);
            Ok(())
        } else {
            Err(TypeError::OutOfBounds {
                i: self.vec.len() + 1,
                len: N::to_usize(),
            })
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.vec.clone()
    }
}

/// Truncates to the maximum length.
impl<T, N: Unsigned> From<Vec<T>> for VariableList<T, N> {
    fn from(mut vec: Vec<T>) -> Self {
        vec.truncate(N::to_usize());
        Self {
            vec,
            _phantom: PhantomData,
        }
    }
}

impl<T, N: Unsigned> Default for VariableList<T, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, N: Unsigned> From<VariableList<T, N>> for Vec<T> {
    fn from(list: VariableList<T, N>) -> Vec<T> {
        list.vec
    }
}

impl<T, N: Unsigned, I: SliceIndex<[T]>> Index<I> for VariableList<T, N> {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        Index::index(&self.vec, index)
    }
}

impl<T, N: Unsigned, I: SliceIndex<[T]>> IndexMut<I> for VariableList<T, N> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(&mut self.vec, index)
    }
}

impl<T, N: Unsigned> Deref for VariableList<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.vec[..]
    }
}

impl<T, N: Unsigned> DerefMut for VariableList<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.vec[..]
    }
}

impl<'a, T, N: Unsigned> IntoIterator for &'a VariableList<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: SszEncode, N: Unsigned> SszEncode for VariableList<T, N> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.vec.as_ssz_bytes()
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        self.vec.ssz_bytes_len()
    }
}

impl<T: SszDecode, N: Unsigned> SszDecode for VariableList<T, N> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        let items = <Vec<T>>::from_ssz_bytes(bytes)?;

        if items.len() > N::to_usize() {
            return Err(SszDecodeError::ListTooLong {
                len: items.len(),
                max: N::to_usize(),
            });
        }

        Ok(Self {
            vec: items,
            _phantom: PhantomData,
        })
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }
}

impl<T: TreeHash, N: Unsigned> TreeHash for VariableList<T, N> {
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
        let root = match T::tree_hash_type() {
            TreeHashType::Basic => {
                let mut packed = Vec::with_capacity(self.len() * BYTES_PER_CHUNK);
                for element in self.iter() {
                    packed.append(&mut element.tree_hash_packed_encoding());
                }
                let chunk_limit = (N::to_usize() + T::tree_hash_packing_factor() - 1)
                    / T::tree_hash_packing_factor();
                merkleize_chunks(&pack_bytes(&packed), chunk_limit)
            }
            _ => {
                let roots: Vec<H256> = self.iter().map(TreeHash::tree_hash_root).collect();
                merkleize_chunks(&roots, N::to_usize())
            }
        };
        mix_in_length(root, self.len())
    }
}

impl<T: Serialize, N: Unsigned> Serialize for VariableList<T, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.vec.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, N: Unsigned> Deserialize<'de> for VariableList<T, N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let vec = <Vec<T>>::deserialize(deserializer)?;
        Self::new(vec).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}
