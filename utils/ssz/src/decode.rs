#![allow(clippy::use_self)]

use crate::*;
use ethereum_types::H256;

macro_rules! decode_for_uintn {
    ( $(($type_ident: ty, $size_in_bits: expr)),* ) => { $(
        impl SszDecode for $type_ident {
            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
                if bytes.len() == <Self as SszDecode>::ssz_fixed_len() {
                    let mut arr = [0; $size_in_bits / 8];
                    arr.clone_from_slice(bytes);
                    Ok(<$type_ident>::from_le_bytes(arr))
                } else {
                    Err(SszDecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: <Self as SszDecode>::ssz_fixed_len(),
                    })
                }
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $size_in_bits / 8
            }
        }
    )* };
}

decode_for_uintn!((u8, 8), (u16, 16), (u32, 32), (u64, 64));

macro_rules! decode_for_u8_array {
    ($size: expr) => {
        impl SszDecode for [u8; $size] {
            fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
                if bytes.len() == <Self as SszDecode>::ssz_fixed_len() {
                    let mut array: [u8; $size] = [0; $size];
                    array.copy_from_slice(bytes);

                    Ok(array)
                } else {
                    Err(SszDecodeError::InvalidByteLength {
                        len: bytes.len(),
                        expected: <Self as SszDecode>::ssz_fixed_len(),
                    })
                }
            }

            fn is_ssz_fixed_len() -> bool {
                true
            }

            fn ssz_fixed_len() -> usize {
                $size
            }
        }
    };
}

decode_for_u8_array!(4);
decode_for_u8_array!(20);
decode_for_u8_array!(32);
decode_for_u8_array!(48);
decode_for_u8_array!(96);

impl SszDecode for bool {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        if bytes.len() == <Self as SszDecode>::ssz_fixed_len() {
            match bytes[0] {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(SszDecodeError::BytesInvalid(format!(
                    "cannot deserialize bool from {}",
                    bytes[0]
                ))),
            }
        } else {
            Err(SszDecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: <Self as SszDecode>::ssz_fixed_len(),
            })
        }
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        1
    }
}

impl SszDecode for H256 {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        let len = bytes.len();
        let expected = <Self as SszDecode>::ssz_fixed_len();

        if len == expected {
            Ok(H256::from_slice(bytes))
        } else {
            Err(SszDecodeError::InvalidByteLength { len, expected })
        }
    }

    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        32
    }
}

impl<T: SszDecode> SszDecode for Vec<T> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        let bytes_len = bytes.len();
        let fixed_len = <T as SszDecode>::ssz_fixed_len();

        if bytes.is_empty() {
            Ok(vec![])
        } else if !T::is_ssz_fixed_len() {
            decode_variable_sized_items(bytes)
        } else if bytes_len % fixed_len == 0 {
            let mut result = Vec::with_capacity(bytes_len / fixed_len);
            for chunk in bytes.chunks(fixed_len) {
                result.push(T::from_ssz_bytes(chunk)?);
            }

            Ok(result)
        } else {
            Err(SszDecodeError::InvalidByteLength {
                len: bytes_len,
                expected: bytes_len / fixed_len * fixed_len,
            })
        }
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }
}

impl<T: SszDecode> SszDecode for Option<T> {
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, SszDecodeError> {
        if bytes.len() < BYTES_PER_LENGTH_OFFSET {
            return Err(SszDecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: BYTES_PER_LENGTH_OFFSET,
            });
        }

        let (selector_bytes, value_bytes) = bytes.split_at(BYTES_PER_LENGTH_OFFSET);

        match decode_offset(selector_bytes)? {
            0 => Ok(None),
            1 => Ok(Some(T::from_ssz_bytes(value_bytes)?)),
            selector => Err(SszDecodeError::BytesInvalid(format!(
                "{} is not a valid union selector for Option<T>",
                selector
            ))),
        }
    }

    fn is_ssz_fixed_len() -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uintn() {
        assert_eq!(u8::from_ssz_bytes(&[0b1000_0000]).expect("Test"), 128);
        assert_eq!(u16::from_ssz_bytes(&[0, 0b1000_0000]).expect("Test"), 0x8000);
        assert_eq!(
            u64::from_ssz_bytes(&[0xff; 8]).expect("Test"),
            u64::max_value()
        );

        assert!(u8::from_ssz_bytes(&[]).is_err());
        assert!(u64::from_ssz_bytes(&[0; 9]).is_err());
    }

    #[test]
    fn bool() {
        assert_eq!(bool::from_ssz_bytes(&[0_u8]).expect("Test"), false);
        assert_eq!(bool::from_ssz_bytes(&[1_u8]).expect("Test"), true);

        assert!(bool::from_ssz_bytes(&[2_u8]).is_err());
        assert!(bool::from_ssz_bytes(&[0_u8, 0_u8]).is_err());
    }

    #[test]
    fn u8_array() {
        assert_eq!(<[u8; 4]>::from_ssz_bytes(&[3; 4]).expect("Test"), [3; 4]);
        assert!(<[u8; 48]>::from_ssz_bytes(&[0; 47]).is_err());
    }

    #[test]
    fn h256() {
        assert_eq!(H256::from_ssz_bytes(&[0; 32]).expect("Test"), H256::zero());

        assert!(H256::from_ssz_bytes(&[0; 31]).is_err());
        assert!(H256::from_ssz_bytes(&[0; 33]).is_err());
    }

    #[test]
    fn vector_fixed() {
        assert_eq!(
            <Vec<u16>>::from_ssz_bytes(&[1, 0, 2, 0, 3, 0, 4, 0]).expect("Test"),
            vec![1, 2, 3, 4]
        );
        assert!(<Vec<u32>>::from_ssz_bytes(&[0, 1, 2, 4, 5]).is_err());
    }

    #[test]
    fn vector_variable() {
        let vec: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![4, 5, 6]];
        assert_eq!(
            <Vec<Vec<u8>>>::from_ssz_bytes(&[8, 0, 0, 0, 11, 0, 0, 0, 1, 2, 3, 4, 5, 6])
                .expect("Test"),
            vec
        );

        // offset is too large
        assert!(<Vec<Vec<u8>>>::from_ssz_bytes(&[10, 0, 0, 0, 2]).is_err());
        // offsets decrease
        assert!(<Vec<Vec<u8>>>::from_ssz_bytes(&[8, 0, 0, 0, 6, 0, 0, 0, 1]).is_err());
    }

    #[test]
    fn option() {
        assert_eq!(
            <Option<u16>>::from_ssz_bytes(&[1, 0, 0, 0, 42, 0]).expect("Test"),
            Some(42)
        );
        assert_eq!(<Option<u16>>::from_ssz_bytes(&[0; 4]).expect("Test"), None);

        assert!(<Option<u16>>::from_ssz_bytes(&[2, 0, 0, 0]).is_err());
        assert!(<Option<u16>>::from_ssz_bytes(&[1, 0, 0]).is_err());
    }
}
