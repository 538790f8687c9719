mod decode;
mod encode;
mod merkle;
mod tree_hash;
mod types;
mod utils;

pub use merkle::{hash, hash_concat, merkleize_chunks, mix_in_length, pack_bytes, zero_hash};
pub use tree_hash::{TreeHash, TreeHashType, BYTES_PER_CHUNK};
pub use types::{length, BitList, BitVector, Bitfield, FixedVector, TypeError, VariableList};
pub use utils::{
    decode_offset, decode_variable_sized_items, encode_items_from_parts, encode_offset, ssz_encode,
    Decoder,
};

pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

pub trait SszEncode {
    fn as_ssz_bytes(&self) -> Vec<u8>;

    fn is_ssz_fixed_len() -> bool;

    /// Serialised length in bytes without materialising the byte stream.
    fn ssz_bytes_len(&self) -> usize;

    fn ssz_fixed_len() -> usize {
        BYTES_PER_LENGTH_OFFSET
    }
}

pub trait SszDecode: Sized {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError>;

    fn is_ssz_fixed_len() -> bool;

    fn ssz_fixed_len() -> usize {
        BYTES_PER_LENGTH_OFFSET
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum SszDecodeError {
    /// A fixed-size frame is not exactly its declared length.
    InvalidByteLength { len: usize, expected: usize },
    /// An offset points outside the frame.
    OffsetOutOfBounds { offset: usize, len: usize },
    /// Offsets are not monotonically increasing.
    OffsetsNotMonotonic { previous: usize, current: usize },
    /// The first offset does not land immediately after the offset region.
    OffsetIntoFixedPart { offset: usize, fixed_part_len: usize },
    /// A list decoded to more elements than its schema maximum.
    ListTooLong { len: usize, max: usize },
    BytesInvalid(String),
}
