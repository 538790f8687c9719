//! BLS public keys and signatures as opaque byte strings, plus the
//! verification oracle consumed by the state-transition core.
//!
//! Curve arithmetic is deliberately not implemented here. A backend is
//! injected at process start with [`set_verifier`]; until one is installed
//! every verification fails. The [`set_bls_active`] switch short-circuits all
//! verification to `true`, which is how the test suites operate.

mod bytes;
mod verifier;

pub use bytes::{PublicKeyBytes, SignatureBytes};
pub use verifier::{
    aggregate_pubkeys, bls_active, set_bls_active, set_verifier, verify, verify_aggregate,
    Verifier,
};
