//! Identity types of spec.md §3: `TransactionReference`, `StorageReference`
//! and the 128-byte `StateId`.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte content hash of a request. Totally ordered by hash bytes.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize,
)]
pub struct TransactionReference(pub [u8; 32]);

impl TransactionReference {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionReference({})", self.to_hex())
    }
}

impl fmt::Display for TransactionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identifies an object created by `creator` with ordinal `progressive`.
/// Object identity in the store (spec.md §3).
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize, Deserialize, Debug,
)]
pub struct StorageReference {
    pub creator: TransactionReference,
    pub progressive: u64,
}

impl StorageReference {
    pub const fn new(creator: TransactionReference, progressive: u64) -> Self {
        Self {
            creator,
            progressive,
        }
    }

    /// The canonical store key for this object's history entry.
    pub fn history_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(40);
        key.extend_from_slice(&self.creator.0);
        key.extend_from_slice(&self.progressive.to_be_bytes());
        key
    }
}

impl fmt::Display for StorageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.creator, self.progressive)
    }
}

/// `state_id = rootResponses || rootInfo || rootRequests || rootHistories`,
/// 128 bytes total (spec.md §3, §6).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct StateId {
    pub root_responses: [u8; 32],
    pub root_info: [u8; 32],
    pub root_requests: [u8; 32],
    pub root_histories: [u8; 32],
}

impl StateId {
    pub const EMPTY: StateId = StateId {
        root_responses: [0u8; 32],
        root_info: [0u8; 32],
        root_requests: [0u8; 32],
        root_histories: [0u8; 32],
    };

    pub fn to_bytes(&self) -> [u8; 128] {
        let mut out = [0u8; 128];
        out[0..32].copy_from_slice(&self.root_responses);
        out[32..64].copy_from_slice(&self.root_info);
        out[64..96].copy_from_slice(&self.root_requests);
        out[96..128].copy_from_slice(&self.root_histories);
        out
    }

    pub fn from_bytes(bytes: &[u8; 128]) -> Self {
        let mut root_responses = [0u8; 32];
        let mut root_info = [0u8; 32];
        let mut root_requests = [0u8; 32];
        let mut root_histories = [0u8; 32];
        root_responses.copy_from_slice(&bytes[0..32]);
        root_info.copy_from_slice(&bytes[32..64]);
        root_requests.copy_from_slice(&bytes[64..96]);
        root_histories.copy_from_slice(&bytes[96..128]);
        Self {
            root_responses,
            root_info,
            root_requests,
            root_histories,
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_id_roundtrip() {
        let id = StateId {
            root_responses: [1u8; 32],
            root_info: [2u8; 32],
            root_requests: [3u8; 32],
            root_histories: [4u8; 32],
        };
        let bytes = id.to_bytes();
        assert_eq!(bytes.len(), 128);
        let back = StateId::from_bytes(&bytes);
        assert_eq!(id, back);
    }

    #[test]
    fn ordering_is_by_bytes() {
        let a = TransactionReference([0u8; 32]);
        let mut b = [0u8; 32];
        b[31] = 1;
        let b = TransactionReference(b);
        assert!(a < b);
    }
}
