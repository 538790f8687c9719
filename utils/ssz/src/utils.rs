use crate::*;

pub fn ssz_encode<T: SszEncode>(val: &T) -> Vec<u8> {
    val.as_ssz_bytes()
}

pub fn encode_offset(offset: usize) -> Vec<u8> {
    offset.to_le_bytes()[..BYTES_PER_LENGTH_OFFSET].to_vec()
}

pub fn encode_items_from_parts(
    fixed_parts: &[Option<Vec<u8>>],
    variable_parts: &[Vec<u8>],
) -> Vec<u8> {
    let item_count = fixed_parts.len();

    let fixed_length: usize = fixed_parts
        .iter()
        .map(|part| match part {
            Some(bytes) => bytes.len(),
            None => BYTES_PER_LENGTH_OFFSET,
        })
        .sum();

    let variable_lengths: Vec<usize> = variable_parts.iter().map(std::vec::Vec::len).collect();

    let mut variable_offsets = Vec::with_capacity(item_count);
    for i in 0..item_count {
        let variable_length_sum: usize = variable_lengths[..i].iter().sum();
        let offset = fixed_length + variable_length_sum;
        variable_offsets.push(encode_offset(offset));
    }

    let fixed_parts: Vec<&Vec<u8>> = fixed_parts
        .iter()
        .enumerate()
        .map(|(i, part)| match part {
            Some(bytes) => bytes,
            None => &variable_offsets[i],
        })
        .collect();

    let variable_lengths_sum: usize = variable_lengths.iter().sum();
    let total_bytes = fixed_length + variable_lengths_sum;
    let mut result = Vec::with_capacity(total_bytes);

    for part in fixed_parts {
        result.extend(part);
    }

    for part in variable_parts {
        result.extend(part);
    }

    result
}

pub fn decode_offset(bytes: &[u8]) -> Result<usize, SszDecodeError> {
    if bytes.len() == BYTES_PER_LENGTH_OFFSET {
        let mut arr = [0; BYTES_PER_LENGTH_OFFSET];
        arr.clone_from_slice(bytes);
        Ok(u32::from_le_bytes(arr) as usize)
    } else {
        Err(SszDecodeError::InvalidByteLength {
            len: bytes.len(),
            expected: BYTES_PER_LENGTH_OFFSET,
        })
    }
}

pub fn decode_variable_sized_items<T: SszDecode>(bytes: &[u8]) -> Result<Vec<T>, SszDecodeError> {
    let first_offset = match bytes.get(0..BYTES_PER_LENGTH_OFFSET) {
        Some(first_offset_bytes) => decode_offset(first_offset_bytes),
        _ => Err(SszDecodeError::InvalidByteLength {
            len: bytes.len(),
            expected: BYTES_PER_LENGTH_OFFSET,
        }),
    }?;

    if first_offset % BYTES_PER_LENGTH_OFFSET != 0 || first_offset > bytes.len() {
        return Err(SszDecodeError::OffsetOutOfBounds {
            offset: first_offset,
            len: bytes.len(),
        });
    }

    let number_of_elements = first_offset / BYTES_PER_LENGTH_OFFSET;
    let mut result = Vec::with_capacity(number_of_elements);

    let mut previous_offset = first_offset;
    for i in 1..=number_of_elements {
        let next_offset = if i == number_of_elements {
            bytes.len()
        } else {
            match bytes.get(i * BYTES_PER_LENGTH_OFFSET..(i + 1) * BYTES_PER_LENGTH_OFFSET) {
                Some(offset_bytes) => decode_offset(offset_bytes),
                _ => Err(SszDecodeError::InvalidByteLength {
                    len: bytes.len(),
                    expected: (i + 1) * BYTES_PER_LENGTH_OFFSET,
                }),
            }?
        };

        if next_offset < previous_offset {
            return Err(SszDecodeError::OffsetsNotMonotonic {
                previous: previous_offset,
                current: next_offset,
            });
        }
        if next_offset > bytes.len() || next_offset < first_offset {
            return Err(SszDecodeError::OffsetOutOfBounds {
                offset: next_offset,
                len: bytes.len(),
            });
        }

        result.push(T::from_ssz_bytes(&bytes[previous_offset..next_offset])?);
        previous_offset = next_offset;
    }
    Ok(result)
}

/// Splits a container frame into per-field slices. Fields are registered with
/// `next_type` in declaration order, then read back with `deserialize_next`.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    registration_offset: usize,
    fixed_part_offset: usize,
    offsets: Vec<usize>,
    current_offset_index: usize,
}

impl<'a> Decoder<'a> {
    pub fn for_bytes(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            registration_offset: 0,
            fixed_part_offset: 0,
            offsets: vec![],
            current_offset_index: 0,
        }
    }

    pub fn next_type<T: SszDecode>(&mut self) -> Result<(), SszDecodeError> {
        if !T::is_ssz_fixed_len() {
            let offset = match self
                .bytes
                .get(self.registration_offset..self.registration_offset + BYTES_PER_LENGTH_OFFSET)
            {
                Some(offset_bytes) => decode_offset(offset_bytes),
                _ => Err(SszDecodeError::InvalidByteLength {
                    len: self.bytes.len(),
                    expected: self.registration_offset + BYTES_PER_LENGTH_OFFSET,
                }),
            }?;
            if offset > self.bytes.len() {
                return Err(SszDecodeError::OffsetOutOfBounds {
                    offset,
                    len: self.bytes.len(),
                });
            }
            if let Some(previous) = self.offsets.last() {
                if offset < *previous {
                    return Err(SszDecodeError::OffsetsNotMonotonic {
                        previous: *previous,
                        current: offset,
                    });
                }
            }
            self.offsets.push(offset);
        }
        self.registration_offset += T::ssz_fixed_len();
        Ok(())
    }

    /// The fixed part ends where the first variable payload begins. An offset
    /// pointing back into the offset region is malformed.
    pub fn finalize(&self) -> Result<(), SszDecodeError> {
        if let Some(first) = self.offsets.first() {
            if *first != self.registration_offset {
                return Err(SszDecodeError::OffsetIntoFixedPart {
                    offset: *first,
                    fixed_part_len: self.registration_offset,
                });
            }
        }
        Ok(())
    }

    pub fn deserialize_next<T: SszDecode>(&mut self) -> Result<T, SszDecodeError> {
        let result = if T::is_ssz_fixed_len() {
            match self
                .bytes
                .get(self.fixed_part_offset..self.fixed_part_offset + T::ssz_fixed_len())
            {
                Some(field_bytes) => T::from_ssz_bytes(field_bytes),
                _ => Err(SszDecodeError::InvalidByteLength {
                    len: self.bytes.len(),
                    expected: self.fixed_part_offset + T::ssz_fixed_len(),
                }),
            }
        } else {
            let current_offset = match self.offsets.get(self.current_offset_index) {
                Some(offset) => Ok(*offset),
                _ => Err(SszDecodeError::InvalidByteLength {
                    len: self.bytes.len(),
                    expected: self.current_offset_index,
                }),
            }?;

            let next_offset = match self.offsets.get(self.current_offset_index + 1) {
                Some(offset) => *offset,
                _ => self.bytes.len(),
            };

            match self.bytes.get(current_offset..next_offset) {
                Some(field_bytes) => T::from_ssz_bytes(field_bytes),
                _ => Err(SszDecodeError::OffsetOutOfBounds {
                    offset: next_offset,
                    len: self.bytes.len(),
                }),
            }
        };

        if result.is_ok() {
            if !T::is_ssz_fixed_len() {
                self.current_offset_index += 1;
            }
            self.fixed_part_offset += T::ssz_fixed_len();
        }

        result
    }
}
