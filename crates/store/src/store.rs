// Path: crates/store/src/store.rs
//! The `Store` facade: `getRequest`/`getResponse`/`getHistory`/`getManifest`/
//! `getStateId`/`checkoutAt` over the four tries (spec.md §4.3).

use crate::transformation::StoreTransformation;
use jarnet_storage::NodeStoreBackend;
use jarnet_trie::Trie;
use jarnet_types::codec::{from_bytes_canonical, to_bytes_canonical};
use jarnet_types::error::{StateError, StoreError};
use jarnet_types::reference::{StateId, StorageReference, TransactionReference};
use jarnet_types::request::TransactionRequest;
use jarnet_types::response::TransactionResponse;
use std::sync::Arc;

const ROOT_REQUESTS: &str = "requests";
const ROOT_RESPONSES: &str = "responses";
const ROOT_HISTORIES: &str = "histories";
const ROOT_INFO: &str = "info";

const INFO_MANIFEST_KEY: &[u8] = b"manifest";
const INFO_COMMITS_KEY: &[u8] = b"commits";
const INFO_HEIGHT_KEY: &[u8] = b"height";

/// A read/write handle onto one [`StateId`]'s worth of state, shared across
/// all open `Store`s by the backend they wrap.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn NodeStoreBackend>,
    state_id: StateId,
}

fn present_root(root: [u8; 32]) -> Option<[u8; 32]> {
    (root != [0u8; 32]).then_some(root)
}

fn decode<T: parity_scale_codec::Decode>(bytes: &[u8]) -> Result<T, StoreError> {
    from_bytes_canonical(bytes)
        .map_err(|e| StateError::CorruptNode(e.to_string()))
        .map_err(StoreError::from)
}

impl Store {
    /// An empty store with no committed state — the node's pre-genesis view.
    pub fn new(backend: Arc<dyn NodeStoreBackend>) -> Self {
        Self {
            backend,
            state_id: StateId::EMPTY,
        }
    }

    /// Opens the store as of a known `state_id` (spec.md §4.3: `checkoutAt`).
    /// This never touches the backend; reads are resolved lazily, so an
    /// unreachable root surfaces as a [`StateError`] on first access rather
    /// than here.
    pub fn checkout_at(backend: Arc<dyn NodeStoreBackend>, state_id: StateId) -> Self {
        Self { backend, state_id }
    }

    pub fn state_id(&self) -> StateId {
        self.state_id
    }

    pub fn get_request(&self, tref: &TransactionReference) -> Result<Option<TransactionRequest>, StoreError> {
        let trie = Trie::new(self.backend.as_ref(), ROOT_REQUESTS);
        let root = present_root(self.state_id.root_requests);
        match trie.get(root, tref.as_bytes()).map_err(StateError::from)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_response(&self, tref: &TransactionReference) -> Result<Option<TransactionResponse>, StoreError> {
        let trie = Trie::new(self.backend.as_ref(), ROOT_RESPONSES);
        let root = present_root(self.state_id.root_responses);
        match trie.get(root, tref.as_bytes()).map_err(StateError::from)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The object's history, newest-first, empty if the object has never
    /// been updated (spec.md §3).
    pub fn get_history(&self, object: &StorageReference) -> Result<Vec<TransactionReference>, StoreError> {
        let trie = Trie::new(self.backend.as_ref(), ROOT_HISTORIES);
        let root = present_root(self.state_id.root_histories);
        match trie.get(root, &object.history_key()).map_err(StateError::from)? {
            Some(bytes) => decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    pub fn get_manifest(&self) -> Result<Option<TransactionReference>, StoreError> {
        self.read_info(INFO_MANIFEST_KEY)
    }

    pub fn number_of_commits(&self) -> Result<u64, StoreError> {
        Ok(self.read_info::<u64>(INFO_COMMITS_KEY)?.unwrap_or(0))
    }

    pub fn height(&self) -> Result<u64, StoreError> {
        Ok(self.read_info::<u64>(INFO_HEIGHT_KEY)?.unwrap_or(0))
    }

    fn read_info<T: parity_scale_codec::Decode>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        let trie = Trie::new(self.backend.as_ref(), ROOT_INFO);
        let root = present_root(self.state_id.root_info);
        match trie.get(root, key).map_err(StateError::from)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Applies `txn` atomically, returning a new `Store` at the resulting
    /// `StateId`. `self` remains a valid historical checkout (spec.md §4.1:
    /// puts never mutate existing nodes).
    pub fn commit(&self, txn: StoreTransformation) -> Result<Store, StoreError> {
        let mut next = self.state_id;

        if !txn.requests.is_empty() {
            let entries: Vec<(Vec<u8>, Vec<u8>)> = txn
                .requests
                .iter()
                .map(|(r, req)| (r.as_bytes().to_vec(), to_bytes_canonical(req)))
                .collect();
            next.root_requests = self.apply(ROOT_REQUESTS, present_root(self.state_id.root_requests), &entries)?;
        }

        if !txn.responses.is_empty() {
            let entries: Vec<(Vec<u8>, Vec<u8>)> = txn
                .responses
                .iter()
                .map(|(r, resp)| (r.as_bytes().to_vec(), to_bytes_canonical(resp)))
                .collect();
            next.root_responses = self.apply(ROOT_RESPONSES, present_root(self.state_id.root_responses), &entries)?;
        }

        if !txn.histories.is_empty() {
            let entries: Vec<(Vec<u8>, Vec<u8>)> = txn
                .histories
                .iter()
                .map(|(obj, history)| (obj.history_key(), to_bytes_canonical(history)))
                .collect();
            next.root_histories = self.apply(ROOT_HISTORIES, present_root(self.state_id.root_histories), &entries)?;
        }

        let mut info_entries = Vec::new();
        if let Some(manifest) = txn.manifest {
            info_entries.push((INFO_MANIFEST_KEY.to_vec(), to_bytes_canonical(&manifest)));
        }
        info_entries.push((
            INFO_COMMITS_KEY.to_vec(),
            to_bytes_canonical(&(self.number_of_commits()? + 1)),
        ));
        info_entries.push((INFO_HEIGHT_KEY.to_vec(), to_bytes_canonical(&(self.height()? + 1))));
        next.root_info = self.apply(ROOT_INFO, present_root(self.state_id.root_info), &info_entries)?;

        Ok(Store {
            backend: self.backend.clone(),
            state_id: next,
        })
    }

    fn apply(
        &self,
        root_name: &'static str,
        root: Option<[u8; 32]>,
        entries: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<[u8; 32], StoreError> {
        let trie = Trie::new(self.backend.as_ref(), root_name);
        let (new_root, nodes) = trie.put_batch(root, entries).map_err(StateError::from)?;
        trie.commit(new_root, nodes).map_err(StateError::from)?;
        Ok(new_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarnet_storage::MemoryBackend;
    use jarnet_types::gas::GasCosts;
    use jarnet_types::response::TransactionResponse;

    fn backend() -> Arc<dyn NodeStoreBackend> {
        Arc::new(MemoryBackend::new())
    }

    #[test]
    fn fresh_store_has_no_manifest_and_empty_histories() {
        let store = Store::new(backend());
        assert_eq!(store.get_manifest().expect("manifest"), None);
        let obj = StorageReference::new(TransactionReference::new([1u8; 32]), 0);
        assert_eq!(store.get_history(&obj).expect("history"), Vec::new());
        assert_eq!(store.number_of_commits().expect("commits"), 0);
        assert_eq!(store.height().expect("height"), 0);
    }

    #[test]
    fn commit_advances_state_and_is_independently_readable() {
        let store = Store::new(backend());
        let tref = TransactionReference::new([2u8; 32]);
        let request = TransactionRequest::JarStoreInitial { jar_bytes: vec![1, 2, 3] };
        let response = TransactionResponse::void_successful(vec![], vec![], GasCosts::zero());

        let mut txn = StoreTransformation::new();
        txn.put_request(tref, request.clone());
        txn.put_response(tref, response.clone());
        txn.set_manifest(tref);

        let next = store.commit(txn).expect("commit");

        assert_eq!(next.get_request(&tref).expect("get_request"), Some(request));
        assert_eq!(next.get_response(&tref).expect("get_response"), Some(response));
        assert_eq!(next.get_manifest().expect("manifest"), Some(tref));
        assert_eq!(next.number_of_commits().expect("commits"), 1);
        assert_eq!(next.height().expect("height"), 1);

        // The original checkout is untouched (copy-on-write).
        assert_eq!(store.get_request(&tref).expect("old get_request"), None);
        assert_eq!(store.state_id(), StateId::EMPTY);
    }

    #[test]
    fn checkout_at_reopens_a_past_state_id() {
        let shared = backend();
        let store = Store::new(shared.clone());
        let obj = StorageReference::new(TransactionReference::new([3u8; 32]), 0);
        let creator = TransactionReference::new([3u8; 32]);

        let mut txn = StoreTransformation::new();
        txn.set_history(obj, vec![creator]);
        let committed = store.commit(txn).expect("commit");
        let state_id = committed.state_id();

        let reopened = Store::checkout_at(shared, state_id);
        assert_eq!(reopened.get_history(&obj).expect("history"), vec![creator]);
    }
}
