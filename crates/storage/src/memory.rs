// Path: crates/storage/src/memory.rs
//! An in-process [`NodeStoreBackend`] backed by `dashmap`, used for tests and
//! nodes that do not require durability across restarts.

use crate::backend::{CommitBatch, NodeHash, NodeStoreBackend};
use crate::error::StorageError;
use dashmap::DashMap;
use jarnet_telemetry::sinks::storage_metrics;

#[derive(Default)]
pub struct MemoryBackend {
    nodes: DashMap<NodeHash, Vec<u8>, ahash::RandomState>,
    roots: DashMap<&'static str, NodeHash, ahash::RandomState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStoreBackend for MemoryBackend {
    fn get_node(&self, hash: &NodeHash) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.nodes.get(hash).map(|v| v.clone()))
    }

    fn commit(&self, batch: CommitBatch) -> Result<(), StorageError> {
        let written = batch.new_nodes.len() as u64;
        let mut bytes_written = 0u64;
        for (hash, bytes) in batch.new_nodes {
            bytes_written += bytes.len() as u64;
            self.nodes.entry(hash).or_insert(bytes);
        }
        self.roots.insert(batch.root_name, batch.new_root);
        storage_metrics().inc_nodes_written(written);
        storage_metrics().inc_bytes_written_total(bytes_written);
        Ok(())
    }

    fn root(&self, root_name: &'static str) -> Result<Option<NodeHash>, StorageError> {
        Ok(self.roots.get(root_name).map(|v| *v))
    }
}
