// Path: crates/crypto/src/sign/mod.rs
//! Signature schemes recognized by `signatureForRequests` (spec.md §6).
//!
//! Request verification is expressed behind the [`SignatureScheme`] trait so
//! the engine never hard-codes a single algorithm; `sha256dsa`, `qtesla1`
//! and `qtesla3` are named in configuration but left as a seam for a
//! dedicated post-quantum crate to plug into, matching how the node treats
//! `signatureForRequests` as pluggable rather than fixed.

pub mod eddsa;

use crate::error::CryptoError;

/// A public key capable of verifying signatures produced by its scheme.
pub trait SignatureScheme {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;
    fn name(&self) -> &'static str;
}

/// A key pair capable of signing on behalf of an externally-owned account.
pub trait SigningKeyPair {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn public_key_bytes(&self) -> Vec<u8>;
}

/// Accepts every signature unconditionally. Used only when
/// `signatureForRequests = "empty"`, i.e. dev/test nodes (spec.md §6).
#[derive(Default, Clone, Copy)]
pub struct EmptyScheme;

impl SignatureScheme for EmptyScheme {
    fn verify(&self, _public_key: &[u8], _message: &[u8], _signature: &[u8]) -> Result<(), CryptoError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "empty"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scheme_accepts_anything() {
        let scheme = EmptyScheme;
        assert!(scheme.verify(&[], &[1, 2, 3], &[]).is_ok());
    }
}
