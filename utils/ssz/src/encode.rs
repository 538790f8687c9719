#![allow(clippy::use_self)]

use crate::utils::*;
use crate::*;
use ethereum_types::H256;

macro_rules! encode_for_uintn {
    ( $(($type_ident: ty, $size_in_bits: expr)),* ) => { $(
        impl SszEncode for $type_ident {
            fn as_ssz_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_bytes_len(&self) -> usize {
                $size_in_bits / 8
            }

            fn ssz_fixed_len() -> usize {
                $size_in_bits / 8
            }
        }
    )* };
}

encode_for_uintn!((u8, 8), (u16, 16), (u32, 32), (u64, 64));

macro_rules! encode_for_u8_array {
    ($size: expr) => {
        impl SszEncode for [u8; $size] {
            fn as_ssz_bytes(&self) -> Vec<u8> {
                self.to_vec()
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_bytes_len(&self) -> usize {
                $size
            }

            fn ssz_fixed_len() -> usize {
                $size
            }
        }
    };
}

encode_for_u8_array!(4);
encode_for_u8_array!(20);
encode_for_u8_array!(32);
encode_for_u8_array!(48);
encode_for_u8_array!(96);

impl SszEncode for bool {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        let byte = if *self { 0b0000_0001 } else { 0b0000_0000 };
        vec![byte]
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_bytes_len(&self) -> usize {
        1
    }

    fn ssz_fixed_len() -> usize {
        1
    }
}

impl SszEncode for H256 {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_bytes_len(&self) -> usize {
        32
    }

    fn ssz_fixed_len() -> usize {
        32
    }
}

impl<T: SszEncode> SszEncode for Vec<T> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        if T::is_ssz_fixed_len() {
            let mut result = Vec::with_capacity(self.len() * T::ssz_fixed_len());
            for element in self {
                result.append(&mut element.as_ssz_bytes());
            }
            result
        } else {
            let mut fixed_parts = Vec::with_capacity(self.len());
            let mut variable_parts = Vec::with_capacity(self.len());
            for element in self {
                fixed_parts.push(None);
                variable_parts.push(element.as_ssz_bytes());
            }
            encode_items_from_parts(&fixed_parts, &variable_parts)
        }
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        if T::is_ssz_fixed_len() {
            self.len() * T::ssz_fixed_len()
        } else {
            self.len() * BYTES_PER_LENGTH_OFFSET
                + self.iter().map(SszEncode::ssz_bytes_len).sum::<usize>()
        }
    }
}

/// SSZ unions are represented by `Option`. `None` carries selector zero and no
/// payload, `Some` carries selector one followed by the value.
impl<T: SszEncode> SszEncode for Option<T> {
    fn as_ssz_bytes(&self) -> Vec<u8> {
        match self {
            None => encode_offset(0),
            Some(t) => {
                let mut result = encode_offset(1);
                result.append(&mut t.as_ssz_bytes());

                result
            }
        }
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn ssz_bytes_len(&self) -> usize {
        match self {
            None => BYTES_PER_LENGTH_OFFSET,
            Some(t) => BYTES_PER_LENGTH_OFFSET + t.ssz_bytes_len(),
        }
    }
}
