use ethereum_types::H256;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::bytes::{PublicKeyBytes, SignatureBytes};

/// The signature-verification oracle. The message is always a 32-byte
/// signing root (object root mixed with a domain).
pub trait Verifier: Send + Sync {
    fn verify(&self, pubkey: &PublicKeyBytes, message: H256, signature: &SignatureBytes) -> bool;

    /// Verification of one signature under the aggregate of `pubkeys`.
    fn verify_aggregate(
        &self,
        pubkeys: &[PublicKeyBytes],
        message: H256,
        signature: &SignatureBytes,
    ) -> bool;

    /// The compressed aggregate of `pubkeys`. Backends without point
    /// arithmetic return the empty pubkey.
    fn aggregate_pubkeys(&self, _pubkeys: &[PublicKeyBytes]) -> PublicKeyBytes {
        PublicKeyBytes::empty()
    }
}

/// Refuses everything. Stands in until a curve backend is injected.
struct NoBackend;

impl Verifier for NoBackend {
    fn verify(&self, _: &PublicKeyBytes, _: H256, _: &SignatureBytes) -> bool {
        false
    }

    fn verify_aggregate(&self, _: &[PublicKeyBytes], _: H256, _: &SignatureBytes) -> bool {
        false
    }
}

#[cfg(not(feature = "fake_crypto"))]
static BLS_ACTIVE: AtomicBool = AtomicBool::new(true);
#[cfg(feature = "fake_crypto")]
static BLS_ACTIVE: AtomicBool = AtomicBool::new(false);

fn registry() -> &'static RwLock<Arc<dyn Verifier>> {
    use std::sync::OnceLock;
    static REGISTRY: OnceLock<RwLock<Arc<dyn Verifier>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(NoBackend)))
}

pub fn bls_active() -> bool {
    BLS_ACTIVE.load(Ordering::SeqCst)
}

pub fn set_bls_active(active: bool) {
    BLS_ACTIVE.store(active, Ordering::SeqCst);
}

pub fn set_verifier(verifier: Arc<dyn Verifier>) {
    *registry().write().expect("verifier registry poisoned") = verifier;
}

pub fn verify(pubkey: &PublicKeyBytes, message: H256, signature: &SignatureBytes) -> bool {
    if !bls_active() {
        return true;
    }
    registry()
        .read()
        .expect("verifier registry poisoned")
        .verify(pubkey, message, signature)
}

pub fn verify_aggregate(
    pubkeys: &[PublicKeyBytes],
    message: H256,
    signature: &SignatureBytes,
) -> bool {
    if !bls_active() {
        return true;
    }
    registry()
        .read()
        .expect("verifier registry poisoned")
        .verify_aggregate(pubkeys, message, signature)
}

pub fn aggregate_pubkeys(pubkeys: &[PublicKeyBytes]) -> PublicKeyBytes {
    registry()
        .read()
        .expect("verifier registry poisoned")
        .aggregate_pubkeys(pubkeys)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test rather than two so the global flag is not raced.
    #[test]
    fn active_flag_gates_the_backend() {
        set_bls_active(true);
        assert!(!verify(
            &PublicKeyBytes::empty(),
            H256::zero(),
            &SignatureBytes::empty(),
        ));

        set_bls_active(false);
        assert!(verify(
            &PublicKeyBytes::empty(),
            H256::zero(),
            &SignatureBytes::empty(),
        ));
    }
}
