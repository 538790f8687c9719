use ethereum_types::H256;
use ssz::{BitList, FixedVector, SszDecode, SszEncode, TreeHash, VariableList};
use ssz_derive::{SszDecode, SszEncode, TreeHash};
use typenum::{U4, U8, U16};

#[derive(Clone, PartialEq, Debug, SszEncode, SszDecode, TreeHash)]
struct Fixed {
    a: u64,
    b: bool,
    c: H256,
}

#[derive(Clone, PartialEq, Debug, SszEncode, SszDecode, TreeHash)]
struct Mixed {
    tag: u16,
    values: VariableList<u64, U16>,
    bits: BitList<U8>,
    roots: FixedVector<H256, U4>,
}

fn mixed() -> Mixed {
    let mut bits = BitList::with_capacity(5).expect("capacity is in bounds");
    bits.set(0, true).expect("bit is in bounds");
    bits.set(3, true).expect("bit is in bounds");

    Mixed {
        tag: 0x1234,
        values: VariableList::new(vec![1, 2, 3]).expect("list is in bounds"),
        bits,
        roots: FixedVector::from(vec![
            H256::repeat_byte(1),
            H256::repeat_byte(2),
            H256::repeat_byte(3),
            H256::repeat_byte(4),
        ]),
    }
}

#[test]
fn fixed_container_layout() {
    let value = Fixed {
        a: 1,
        b: true,
        c: H256::repeat_byte(9),
    };

    let bytes = value.as_ssz_bytes();
    assert_eq!(bytes.len(), 8 + 1 + 32);
    assert_eq!(<Fixed as SszDecode>::ssz_fixed_len(), 41);
    assert!(<Fixed as SszDecode>::is_ssz_fixed_len());

    assert_eq!(Fixed::from_ssz_bytes(&bytes).expect("round trip"), value);
    assert!(Fixed::from_ssz_bytes(&bytes[..40]).is_err());
}

#[test]
fn mixed_container_round_trip() {
    let value = mixed();
    let bytes = value.as_ssz_bytes();

    assert!(!<Mixed as SszDecode>::is_ssz_fixed_len());
    // Fixed part: tag + two offsets + the fixed vector.
    assert_eq!(value.ssz_bytes_len(), bytes.len());

    assert_eq!(Mixed::from_ssz_bytes(&bytes).expect("round trip"), value);
}

#[test]
fn mixed_container_rejects_truncation() {
    let bytes = mixed().as_ssz_bytes();
    assert!(Mixed::from_ssz_bytes(&bytes[..bytes.len() - 1]).is_err());
    assert!(Mixed::from_ssz_bytes(&[]).is_err());
}

#[test]
fn container_root_is_the_merkle_root_of_field_roots() {
    let value = Fixed {
        a: 1,
        b: false,
        c: H256::repeat_byte(3),
    };

    let roots = vec![
        value.a.tree_hash_root(),
        value.b.tree_hash_root(),
        value.c.tree_hash_root(),
    ];
    assert_eq!(value.tree_hash_root(), ssz::merkleize_chunks(&roots, 3));
}

#[test]
fn logical_equality_implies_equal_roots() {
    assert_eq!(mixed().tree_hash_root(), mixed().tree_hash_root());

    let mut other = mixed();
    other.tag = 0x4321;
    assert_ne!(mixed().tree_hash_root(), other.tree_hash_root());
}
