// Path: crates/crypto/src/sign/eddsa/mod.rs
//! Ed25519 signing and verification using `dcrypt`, the default and only
//! fully-implemented scheme for `signatureForRequests = "ed25519"`.

use crate::error::CryptoError;
use crate::sign::{SignatureScheme, SigningKeyPair};
use dcrypt::api::Signature as SignatureTrait;
use dcrypt::sign::eddsa;
use rand::rngs::OsRng;

/// Verifies Ed25519 signatures against raw 32-byte public keys.
#[derive(Default, Clone, Copy)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let pk = eddsa::Ed25519PublicKey::from_bytes(public_key)
            .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
        let sig = eddsa::Ed25519Signature::from_bytes(signature)
            .map_err(|e| CryptoError::InvalidSignature(format!("{e:?}")))?;
        eddsa::Ed25519::verify(message, &sig, &pk).map_err(|_| CryptoError::VerificationFailed)
    }

    fn name(&self) -> &'static str {
        "ed25519"
    }
}

/// An Ed25519 key pair, used by the node's own reward/faucet accounts and in
/// tests constructing signed requests.
#[derive(Clone)]
pub struct Ed25519KeyPair {
    public_key: eddsa::Ed25519PublicKey,
    secret_key: eddsa::Ed25519SecretKey,
}

impl Ed25519KeyPair {
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = OsRng;
        let (public_key, secret_key) = eddsa::Ed25519::keypair(&mut rng)
            .map_err(|e| CryptoError::SigningFailed(format!("{e:?}")))?;
        Ok(Self {
            public_key,
            secret_key,
        })
    }

    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret_key = eddsa::Ed25519SecretKey::from_seed(seed)
            .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
        let public_key = secret_key
            .public_key()
            .map_err(|e| CryptoError::InvalidKey(format!("{e:?}")))?;
        Ok(Self {
            public_key,
            secret_key,
        })
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes().to_vec()
    }
}

impl SigningKeyPair for Ed25519KeyPair {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let signature = eddsa::Ed25519::sign(message, &self.secret_key)
            .map_err(|e| CryptoError::SigningFailed(format!("{e:?}")))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        Ed25519KeyPair::public_key_bytes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let keypair = Ed25519KeyPair::generate().expect("keypair");
        let message = b"a transaction request body";
        let signature = keypair.sign(message).expect("sign");

        let scheme = Ed25519Scheme;
        assert!(scheme
            .verify(&keypair.public_key_bytes(), message, &signature)
            .is_ok());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let keypair = Ed25519KeyPair::generate().expect("keypair");
        let signature = keypair.sign(b"original").expect("sign");

        let scheme = Ed25519Scheme;
        assert!(scheme
            .verify(&keypair.public_key_bytes(), b"tampered", &signature)
            .is_err());
    }

    #[test]
    fn same_seed_derives_same_key() {
        let seed = [7u8; 32];
        let a = Ed25519KeyPair::from_seed(&seed).expect("a");
        let b = Ed25519KeyPair::from_seed(&seed).expect("b");
        assert_eq!(a.public_key_bytes(), b.public_key_bytes());
    }
}
