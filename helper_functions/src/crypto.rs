use bls::{PublicKeyBytes, SignatureBytes};
use ethereum_types::H256;
use ssz::TreeHash;

use types::primitives::Domain;

pub use ssz::hash;

pub fn hash_tree_root<T: TreeHash>(value: &T) -> H256 {
    value.tree_hash_root()
}

/// Root actually signed: the object root mixed with its domain.
pub fn signing_root<T: TreeHash>(value: &T, domain: Domain) -> H256 {
    crate::misc::compute_signing_root(value, domain)
}

pub fn bls_verify(pubkey: &PublicKeyBytes, message: H256, signature: &SignatureBytes) -> bool {
    bls::verify(pubkey, message, signature)
}

pub fn bls_verify_aggregate(
    pubkeys: &[PublicKeyBytes],
    message: H256,
    signature: &SignatureBytes,
) -> bool {
    bls::verify_aggregate(pubkeys, message, signature)
}
