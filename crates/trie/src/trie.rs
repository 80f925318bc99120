// Path: crates/trie/src/trie.rs
//! The trie's public operations: historical `get`/`checkout` against any
//! known root, and batched `put` producing a new root plus the set of new
//! nodes to commit (spec.md §4.1: "atomic state transitions").

use crate::nibble::{bytes_to_nibbles, common_prefix_len};
use crate::node::{Node, NodeHash};
use ahash::AHashMap;
use jarnet_storage::backend::{CommitBatch, NodeStoreBackend};
use jarnet_storage::error::StorageError;
use jarnet_telemetry::sinks::storage_metrics;

/// A handle onto one of the four named tries sharing a backend (spec.md
/// §4.1: requests/responses/histories/info).
pub struct Trie<'a> {
    backend: &'a dyn NodeStoreBackend,
    root_name: &'static str,
}

impl<'a> Trie<'a> {
    pub fn new(backend: &'a dyn NodeStoreBackend, root_name: &'static str) -> Self {
        Self { backend, root_name }
    }

    /// The trie's current root, or `None` if nothing has ever been committed
    /// under this name.
    pub fn current_root(&self) -> Result<Option<NodeHash>, StorageError> {
        self.backend.root(self.root_name)
    }

    /// Reads `key` as of `root` (any root this trie has produced in the
    /// past remains readable as long as its nodes have not been
    /// garbage-collected — spec.md's "historical checkout").
    pub fn get(&self, root: Option<NodeHash>, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let nibbles = bytes_to_nibbles(key);
        self.get_at(root, &nibbles)
    }

    fn get_at(&self, node_hash: Option<NodeHash>, nibbles: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(hash) = node_hash else {
            return Ok(None);
        };
        let node = self.load(&hash)?;
        match node {
            Node::Leaf { path, value } => Ok((path == nibbles).then_some(value)),
            Node::Extension { path, child } => {
                if nibbles.len() >= path.len() && &nibbles[..path.len()] == path.as_slice() {
                    self.get_at(Some(child), &nibbles[path.len()..])
                } else {
                    Ok(None)
                }
            }
            Node::Branch { children, value } => {
                if nibbles.is_empty() {
                    Ok(value)
                } else {
                    let child = Node::branch_child(&children, nibbles[0]);
                    self.get_at(child, &nibbles[1..])
                }
            }
        }
    }

    fn load(&self, hash: &NodeHash) -> Result<Node, StorageError> {
        let bytes = self
            .backend
            .get_node(hash)?
            .ok_or(StorageError::NotFound)?;
        parity_scale_codec::Decode::decode(&mut &bytes[..])
            .map_err(|e| StorageError::Backend(format!("corrupt trie node: {e}")))
    }

    /// Inserts `entries` (applied in order, later entries win on duplicate
    /// keys) starting from `root`, returning the new root. The caller is
    /// responsible for committing the returned root via [`Trie::commit`];
    /// `put_batch` stages new nodes but does not persist them.
    pub fn put_batch(
        &self,
        root: Option<NodeHash>,
        entries: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<(NodeHash, Vec<(NodeHash, Vec<u8>)>), StorageError> {
        let mut staged: AHashMap<NodeHash, Vec<u8>> = AHashMap::default();
        let mut current = root;
        for (key, value) in entries {
            let nibbles = bytes_to_nibbles(key);
            current = Some(self.insert(&mut staged, current, &nibbles, value.clone())?);
        }
        let Some(new_root) = current else {
            return Err(StorageError::Backend("put_batch called with no entries".into()));
        };
        Ok((new_root, staged.into_iter().collect()))
    }

    /// Persists a batch produced by [`Trie::put_batch`] and advances this
    /// trie's named root.
    pub fn commit(&self, new_root: NodeHash, new_nodes: Vec<(NodeHash, Vec<u8>)>) -> Result<(), StorageError> {
        let count = new_nodes.len();
        self.backend.commit(CommitBatch {
            root_name: self.root_name,
            new_root,
            new_nodes,
        })?;
        storage_metrics().inc_nodes_written(count as u64);
        Ok(())
    }

    fn store(&self, staged: &mut AHashMap<NodeHash, Vec<u8>>, node: Node) -> NodeHash {
        let hash = node.hash();
        staged.entry(hash).or_insert_with(|| parity_scale_codec::Encode::encode(&node));
        hash
    }

    fn load_for_insert(&self, staged: &AHashMap<NodeHash, Vec<u8>>, hash: &NodeHash) -> Result<Node, StorageError> {
        if let Some(bytes) = staged.get(hash) {
            return parity_scale_codec::Decode::decode(&mut &bytes[..])
                .map_err(|e| StorageError::Backend(format!("corrupt staged node: {e}")));
        }
        self.load(hash)
    }

    fn insert(
        &self,
        staged: &mut AHashMap<NodeHash, Vec<u8>>,
        node_hash: Option<NodeHash>,
        nibbles: &[u8],
        value: Vec<u8>,
    ) -> Result<NodeHash, StorageError> {
        let Some(hash) = node_hash else {
            return Ok(self.store(
                staged,
                Node::Leaf {
                    path: nibbles.to_vec(),
                    value,
                },
            ));
        };
        let node = self.load_for_insert(staged, &hash)?;
        match node {
            Node::Leaf { path, value: old_value } => {
                if path == nibbles {
                    return Ok(self.store(staged, Node::Leaf { path, value }));
                }
                let cp = common_prefix_len(&path, nibbles);
                let mut children = Vec::new();
                let mut branch_value = None;
                if cp == path.len() {
                    branch_value = Some(old_value);
                } else {
                    let leaf_hash = self.store(
                        staged,
                        Node::Leaf {
                            path: path[cp + 1..].to_vec(),
                            value: old_value,
                        },
                    );
                    children = Node::branch_with_child(children, path[cp], leaf_hash);
                }
                if cp == nibbles.len() {
                    branch_value = Some(value);
                } else {
                    let leaf_hash = self.store(
                        staged,
                        Node::Leaf {
                            path: nibbles[cp + 1..].to_vec(),
                            value,
                        },
                    );
                    children = Node::branch_with_child(children, nibbles[cp], leaf_hash);
                }
                let branch_hash = self.store(staged, Node::Branch { children, value: branch_value });
                if cp == 0 {
                    Ok(branch_hash)
                } else {
                    Ok(self.store(
                        staged,
                        Node::Extension {
                            path: path[..cp].to_vec(),
                            child: branch_hash,
                        },
                    ))
                }
            }
            Node::Extension { path, child } => {
                if nibbles.len() >= path.len() && nibbles[..path.len()] == path[..] {
                    let new_child = self.insert(staged, Some(child), &nibbles[path.len()..], value)?;
                    return Ok(self.store(staged, Node::Extension { path, child: new_child }));
                }
                let cp = common_prefix_len(&path, nibbles);
                let ext_rest = &path[cp + 1..];
                let branch_child_hash = if ext_rest.is_empty() {
                    child
                } else {
                    self.store(
                        staged,
                        Node::Extension {
                            path: ext_rest.to_vec(),
                            child,
                        },
                    )
                };
                let mut children = Node::branch_with_child(Vec::new(), path[cp], branch_child_hash);
                let mut branch_value = None;
                if cp == nibbles.len() {
                    branch_value = Some(value);
                } else {
                    let leaf_hash = self.store(
                        staged,
                        Node::Leaf {
                            path: nibbles[cp + 1..].to_vec(),
                            value,
                        },
                    );
                    children = Node::branch_with_child(children, nibbles[cp], leaf_hash);
                }
                let branch_hash = self.store(staged, Node::Branch { children, value: branch_value });
                if cp == 0 {
                    Ok(branch_hash)
                } else {
                    Ok(self.store(
                        staged,
                        Node::Extension {
                            path: path[..cp].to_vec(),
                            child: branch_hash,
                        },
                    ))
                }
            }
            Node::Branch { children, value: branch_value } => {
                if nibbles.is_empty() {
                    return Ok(self.store(staged, Node::Branch { children, value: Some(value) }));
                }
                let nibble = nibbles[0];
                let child = Node::branch_child(&children, nibble);
                let new_child = self.insert(staged, child, &nibbles[1..], value)?;
                let children = Node::branch_with_child(children, nibble, new_child);
                Ok(self.store(staged, Node::Branch { children, value: branch_value }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarnet_storage::memory::MemoryBackend;

    #[test]
    fn put_then_get_round_trips() {
        let backend = MemoryBackend::new();
        let trie = Trie::new(&backend, "requests");
        let (root, nodes) = trie
            .put_batch(None, &[(b"alpha".to_vec(), b"1".to_vec())])
            .expect("put");
        trie.commit(root, nodes).expect("commit");
        assert_eq!(trie.get(Some(root), b"alpha").expect("get"), Some(b"1".to_vec()));
        assert_eq!(trie.get(Some(root), b"beta").expect("get"), None);
    }

    #[test]
    fn diverging_keys_share_a_branch() {
        let backend = MemoryBackend::new();
        let trie = Trie::new(&backend, "responses");
        let (root, nodes) = trie
            .put_batch(
                None,
                &[
                    (b"aaaa".to_vec(), b"1".to_vec()),
                    (b"aaab".to_vec(), b"2".to_vec()),
                    (b"zzzz".to_vec(), b"3".to_vec()),
                ],
            )
            .expect("put");
        trie.commit(root, nodes).expect("commit");
        assert_eq!(trie.get(Some(root), b"aaaa").expect("get"), Some(b"1".to_vec()));
        assert_eq!(trie.get(Some(root), b"aaab").expect("get"), Some(b"2".to_vec()));
        assert_eq!(trie.get(Some(root), b"zzzz").expect("get"), Some(b"3".to_vec()));
    }

    #[test]
    fn historical_root_remains_readable_after_further_writes() {
        let backend = MemoryBackend::new();
        let trie = Trie::new(&backend, "histories");
        let (root1, nodes1) = trie
            .put_batch(None, &[(b"k".to_vec(), b"v1".to_vec())])
            .expect("put1");
        trie.commit(root1, nodes1).expect("commit1");

        let (root2, nodes2) = trie
            .put_batch(Some(root1), &[(b"k".to_vec(), b"v2".to_vec())])
            .expect("put2");
        trie.commit(root2, nodes2).expect("commit2");

        assert_eq!(trie.get(Some(root1), b"k").expect("get1"), Some(b"v1".to_vec()));
        assert_eq!(trie.get(Some(root2), b"k").expect("get2"), Some(b"v2".to_vec()));
    }

    #[test]
    fn roots_are_deterministic_given_same_inserts() {
        let backend_a = MemoryBackend::new();
        let backend_b = MemoryBackend::new();
        let trie_a = Trie::new(&backend_a, "info");
        let trie_b = Trie::new(&backend_b, "info");

        let entries = vec![
            (b"one".to_vec(), b"1".to_vec()),
            (b"two".to_vec(), b"2".to_vec()),
            (b"three".to_vec(), b"3".to_vec()),
        ];
        let (root_a, _) = trie_a.put_batch(None, &entries).expect("a");
        let (root_b, _) = trie_b.put_batch(None, &entries).expect("b");
        assert_eq!(root_a, root_b);
    }
}
