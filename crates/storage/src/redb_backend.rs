// Path: crates/storage/src/redb_backend.rs
//! A durable [`NodeStoreBackend`] backed by `redb`, adapted from the teacher
//! kernel's `RedbEpochStore` (`crates/storage/src/redb_epoch_store.rs`) down
//! to the two tables the trie layer actually needs: content-addressed nodes
//! and named roots.

use crate::backend::{CommitBatch, NodeHash, NodeStoreBackend};
use crate::error::StorageError;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;

const NODES: TableDefinition<&[u8; 32], &[u8]> = TableDefinition::new("NODES");
const ROOTS: TableDefinition<&str, &[u8; 32]> = TableDefinition::new("ROOTS");

pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            let write = db.begin_write().map_err(|e| StorageError::Backend(e.to_string()))?;
            write
                .open_table(NODES)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            write
                .open_table(ROOTS)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            write.commit().map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        Ok(Self { db })
    }
}

impl NodeStoreBackend for RedbBackend {
    fn get_node(&self, hash: &NodeHash) -> Result<Option<Vec<u8>>, StorageError> {
        let read = self.db.begin_read().map_err(|e| StorageError::Backend(e.to_string()))?;
        let table = read.open_table(NODES).map_err(|e| StorageError::Backend(e.to_string()))?;
        let result = table
            .get(hash)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .map(|v| v.value().to_vec());
        Ok(result)
    }

    fn commit(&self, batch: CommitBatch) -> Result<(), StorageError> {
        let write = self.db.begin_write().map_err(|e| StorageError::Backend(e.to_string()))?;
        let mut bytes_written = 0u64;
        {
            let mut nodes = write.open_table(NODES).map_err(|e| StorageError::Backend(e.to_string()))?;
            for (hash, bytes) in &batch.new_nodes {
                bytes_written += bytes.len() as u64;
                nodes
                    .insert(hash, bytes.as_slice())
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            }
            let mut roots = write.open_table(ROOTS).map_err(|e| StorageError::Backend(e.to_string()))?;
            roots
                .insert(batch.root_name, &batch.new_root)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        write.commit().map_err(|e| StorageError::Backend(e.to_string()))?;
        jarnet_telemetry::sinks::storage_metrics().inc_nodes_written(batch.new_nodes.len() as u64);
        jarnet_telemetry::sinks::storage_metrics().inc_bytes_written_total(bytes_written);
        Ok(())
    }

    fn root(&self, root_name: &'static str) -> Result<Option<NodeHash>, StorageError> {
        let read = self.db.begin_read().map_err(|e| StorageError::Backend(e.to_string()))?;
        let table = read.open_table(ROOTS).map_err(|e| StorageError::Backend(e.to_string()))?;
        let result = table
            .get(root_name)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .map(|v| *v.value());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commit_persists_across_handles() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("store.redb");
        let hash = [3u8; 32];
        {
            let backend = RedbBackend::open(&path).expect("open");
            backend
                .commit(CommitBatch {
                    root_name: "info",
                    new_root: hash,
                    new_nodes: vec![(hash, vec![1, 2, 3])],
                })
                .expect("commit");
        }
        let backend = RedbBackend::open(&path).expect("reopen");
        assert_eq!(backend.get_node(&hash).expect("get"), Some(vec![1, 2, 3]));
        assert_eq!(backend.root("info").expect("root"), Some(hash));
    }
}
