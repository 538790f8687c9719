// endianness is not configurable
pub fn int_to_bytes(int: u64, length: usize) -> Vec<u8> {
    let mut vec = int.to_le_bytes().to_vec();
    vec.resize(length, 0);
    vec
}

pub fn bytes_to_int(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

pub fn xor(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut result = [0; 32];
    for (i, byte) in result.iter_mut().enumerate() {
        *byte = left[i] ^ right[i];
    }
    result
}

/// Largest `x` with `x * x <= n`.
pub fn integer_squareroot(n: u64) -> u64 {
    let mut x = n;
    let mut y = x.checked_add(1).map(|sum| sum / 2).unwrap_or(x / 2 + 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_bytes_value0_length_8() {
        assert_eq!(int_to_bytes(0, 8), vec![0; 8]);
    }

    #[test]
    fn test_int_to_bytes_value2521273052_length_8() {
        assert_eq!(
            int_to_bytes(2_521_273_052, 8),
            vec![0xdc, 0x92, 0x47, 0x96, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_bytes_to_int_round_trip() {
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&int_to_bytes(88_813_769, 8));
        assert_eq!(bytes_to_int(bytes), 88_813_769);
    }

    #[test]
    fn test_xor() {
        let left = [0b1010_1010; 32];
        let right = [0b0101_0101; 32];
        assert_eq!(xor(&left, &right), [0b1111_1111; 32]);
        assert_eq!(xor(&left, &left), [0; 32]);
    }

    #[test]
    fn test_integer_squareroot() {
        assert_eq!(integer_squareroot(0), 0);
        assert_eq!(integer_squareroot(1), 1);
        assert_eq!(integer_squareroot(3), 1);
        assert_eq!(integer_squareroot(4), 2);
        assert_eq!(integer_squareroot(63), 7);
        assert_eq!(integer_squareroot(64), 8);
        assert_eq!(integer_squareroot(u64::max_value()), 4_294_967_295);
    }
}
