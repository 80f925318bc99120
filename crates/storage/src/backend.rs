// Path: crates/storage/src/backend.rs
//! The storage seam trie nodes are committed through, adapted from the
//! teacher kernel's `NodeStore`/`CommitInput` pair (`crates/storage/src/adapter.rs`).

use crate::error::StorageError;

/// A content-addressed node, keyed by the hash of its bytes.
pub type NodeHash = [u8; 32];

/// A batch of nodes to persist atomically plus the new named root they
/// belong under. `name` scopes roots across the four tries of spec.md §4.1
/// (requests/responses/histories/info) sharing one backend.
pub struct CommitBatch {
    pub root_name: &'static str,
    pub new_root: NodeHash,
    pub new_nodes: Vec<(NodeHash, Vec<u8>)>,
}

/// A pluggable content-addressed key-value backend for the trie layer.
/// Implementations need not be transactional across roots: the trie layer
/// only ever asks for an atomic commit of one batch at a time.
pub trait NodeStoreBackend: Send + Sync {
    fn get_node(&self, hash: &NodeHash) -> Result<Option<Vec<u8>>, StorageError>;
    fn commit(&self, batch: CommitBatch) -> Result<(), StorageError>;
    fn root(&self, root_name: &'static str) -> Result<Option<NodeHash>, StorageError>;
}
