use ethereum_types::H256;
use ring::digest::{digest, SHA256};
use std::sync::OnceLock;

use crate::tree_hash::BYTES_PER_CHUNK;

/// Deep enough for every schema in use. `VALIDATOR_REGISTRY_LIMIT` is 2^40
/// chunks and each chunk may itself pack multiple basic values.
const MAX_TREE_DEPTH: usize = 64;

pub fn hash(input: &[u8]) -> Vec<u8> {
    digest(&SHA256, input).as_ref().to_vec()
}

pub fn hash_concat(left: H256, right: H256) -> H256 {
    let mut preimage = [0_u8; 2 * BYTES_PER_CHUNK];
    preimage[..BYTES_PER_CHUNK].copy_from_slice(left.as_bytes());
    preimage[BYTES_PER_CHUNK..].copy_from_slice(right.as_bytes());
    H256::from_slice(&hash(&preimage))
}

/// Root of a subtree of the given depth whose chunks are all zero.
pub fn zero_hash(depth: usize) -> H256 {
    static ZERO_HASHES: OnceLock<Vec<H256>> = OnceLock::new();

    let hashes = ZERO_HASHES.get_or_init(|| {
        let mut hashes = vec![H256::zero()];
        for i in 1..=MAX_TREE_DEPTH {
            let previous = hashes[i - 1];
            hashes.push(hash_concat(previous, previous));
        }
        hashes
    });

    hashes[depth]
}

/// Splits a serialised byte stream into 32-byte chunks, zero-padding the last.
pub fn pack_bytes(bytes: &[u8]) -> Vec<H256> {
    let mut chunks = Vec::with_capacity((bytes.len() + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK);
    for chunk_bytes in bytes.chunks(BYTES_PER_CHUNK) {
        let mut chunk = [0_u8; BYTES_PER_CHUNK];
        chunk[..chunk_bytes.len()].copy_from_slice(chunk_bytes);
        chunks.push(H256::from(chunk));
    }
    chunks
}

/// Merkleises `chunks` in a tree padded with zero chunks to `chunk_limit`
/// (rounded up to the next power of two) leaves.
pub fn merkleize_chunks(chunks: &[H256], chunk_limit: usize) -> H256 {
    let width = chunk_limit.max(chunks.len()).max(1);
    let depth = width.next_power_of_two().trailing_zeros() as usize;
    subtree_root(chunks, depth)
}

fn subtree_root(chunks: &[H256], depth: usize) -> H256 {
    if depth == 0 {
        return chunks.first().copied().unwrap_or_else(H256::zero);
    }
    if chunks.is_empty() {
        return zero_hash(depth);
    }

    let split = 1_usize << (depth - 1);
    if chunks.len() <= split {
        hash_concat(subtree_root(chunks, depth - 1), zero_hash(depth - 1))
    } else {
        hash_concat(
            subtree_root(&chunks[..split], depth - 1),
            subtree_root(&chunks[split..], depth - 1),
        )
    }
}

pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut length_chunk = [0_u8; BYTES_PER_CHUNK];
    length_chunk[..8].copy_from_slice(&(length as u64).to_le_bytes());
    hash_concat(root, H256::from(length_chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash() {
        let input = b"lorem ipsum";
        let expected_bytes = [
            0x5e, 0x2b, 0xf5, 0x7d, 0x3f, 0x40, 0xc4, 0xb6, 0xdf, 0x69, 0xda, 0xf1, 0x93, 0x6c,
            0xb7, 0x66, 0xf8, 0x32, 0x37, 0x4b, 0x4f, 0xc0, 0x25, 0x9a, 0x7c, 0xbf, 0xf0, 0x6e,
            0x2f, 0x70, 0xf2, 0x69,
        ];

        assert_eq!(hash(input.as_ref()), expected_bytes.to_vec());
    }

    #[test]
    fn zero_hashes_chain() {
        assert_eq!(zero_hash(0), H256::zero());
        assert_eq!(zero_hash(1), hash_concat(H256::zero(), H256::zero()));
        assert_eq!(zero_hash(2), hash_concat(zero_hash(1), zero_hash(1)));
    }

    #[test]
    fn single_chunk_is_its_own_root() {
        let chunk = H256::repeat_byte(0xab);
        assert_eq!(merkleize_chunks(&[chunk], 1), chunk);
    }

    #[test]
    fn empty_tree_is_zero_hash() {
        assert_eq!(merkleize_chunks(&[], 1), H256::zero());
        assert_eq!(merkleize_chunks(&[], 4), zero_hash(2));
    }

    #[test]
    fn two_chunks() {
        let a = H256::repeat_byte(1);
        let b = H256::repeat_byte(2);
        assert_eq!(merkleize_chunks(&[a, b], 2), hash_concat(a, b));
    }

    #[test]
    fn padding_to_power_of_two() {
        let a = H256::repeat_byte(1);
        let b = H256::repeat_byte(2);
        let c = H256::repeat_byte(3);
        let expected = hash_concat(hash_concat(a, b), hash_concat(c, H256::zero()));
        assert_eq!(merkleize_chunks(&[a, b, c], 4), expected);
        // The same three chunks in a wider tree give a different root.
        assert_ne!(merkleize_chunks(&[a, b, c], 8), expected);
    }

    #[test]
    fn test_mix_in_length() {
        let root = H256::repeat_byte(7);
        let mut length_chunk = [0_u8; 32];
        length_chunk[0] = 3;
        assert_eq!(
            mix_in_length(root, 3),
            hash_concat(root, H256::from(length_chunk))
        );
    }

    #[test]
    fn test_pack_bytes() {
        let chunks = pack_bytes(&[1; 33]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], H256::repeat_byte(1));
        assert_eq!(chunks[1][0], 1);
        assert_eq!(chunks[1][1], 0);
    }
}
