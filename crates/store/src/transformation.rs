// Path: crates/store/src/transformation.rs
//! Accumulates the entries one block's worth of request processing produces
//! before they are applied to the tries in one atomic `commit` (spec.md §4.3:
//! "`StoreTransformation` handle accumulates `(ref -> request)`, `(ref ->
//! response)`, `(obj -> history)`, `manifestSet?`").

use jarnet_types::reference::{StorageReference, TransactionReference};
use jarnet_types::request::TransactionRequest;
use jarnet_types::response::TransactionResponse;
use std::collections::BTreeMap;

#[derive(Default, Debug)]
pub struct StoreTransformation {
    pub(crate) requests: BTreeMap<TransactionReference, TransactionRequest>,
    pub(crate) responses: BTreeMap<TransactionReference, TransactionResponse>,
    pub(crate) histories: BTreeMap<StorageReference, Vec<TransactionReference>>,
    pub(crate) manifest: Option<TransactionReference>,
}

impl StoreTransformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_request(&mut self, tref: TransactionReference, request: TransactionRequest) {
        self.requests.insert(tref, request);
    }

    pub fn put_response(&mut self, tref: TransactionReference, response: TransactionResponse) {
        self.responses.insert(tref, response);
    }

    /// Replaces `object`'s full history (newest-first, spec.md §3) with the
    /// given sequence.
    pub fn set_history(&mut self, object: StorageReference, history: Vec<TransactionReference>) {
        self.histories.insert(object, history);
    }

    pub fn set_manifest(&mut self, manifest: TransactionReference) {
        self.manifest = Some(manifest);
    }

    /// Absorbs another transformation's entries, e.g. the class-loader
    /// reverification side effects of resolving a request's classpath
    /// (spec.md §4.4) into the block-level transformation being built around
    /// it. `other`'s manifest, if set, takes precedence.
    pub fn merge(&mut self, other: StoreTransformation) {
        self.requests.extend(other.requests);
        self.responses.extend(other.responses);
        self.histories.extend(other.histories);
        if let Some(manifest) = other.manifest {
            self.manifest = Some(manifest);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
            && self.responses.is_empty()
            && self.histories.is_empty()
            && self.manifest.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert!(StoreTransformation::new().is_empty());
    }

    #[test]
    fn tracks_whatever_was_set() {
        let mut txn = StoreTransformation::new();
        txn.set_manifest(TransactionReference::new([7u8; 32]));
        assert!(!txn.is_empty());
    }
}
