// Path: crates/trie/src/node.rs
//! Node definitions, adapted from the teacher kernel's
//! `tree/jellyfish/node.rs` into a full (branch/extension/leaf)
//! Merkle-Patricia trie rather than JMT's fixed-depth sparse tree: spec.md
//! calls for tries over variable-length object/transaction-reference keys,
//! which path compression handles far better than a fixed 256-level tree.

use jarnet_crypto::hash::sha256;
use parity_scale_codec::{Decode, Encode};

pub type NodeHash = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Node {
    /// A branch with up to 16 children (one per nibble) and an optional
    /// value when a stored key ends exactly at this node.
    Branch {
        children: Vec<(u8, NodeHash)>,
        value: Option<Vec<u8>>,
    },
    /// A shared nibble-path with a single child, compressing runs with no
    /// branching.
    Extension { path: Vec<u8>, child: NodeHash },
    /// A terminal node: the remaining nibble path plus the stored value.
    Leaf { path: Vec<u8>, value: Vec<u8> },
}

impl Node {
    pub fn hash(&self) -> NodeHash {
        sha256(self.encode())
    }

    pub fn branch_child(children: &[(u8, NodeHash)], nibble: u8) -> Option<NodeHash> {
        children.iter().find(|(n, _)| *n == nibble).map(|(_, h)| *h)
    }

    pub fn branch_with_child(mut children: Vec<(u8, NodeHash)>, nibble: u8, hash: NodeHash) -> Vec<(u8, NodeHash)> {
        if let Some(entry) = children.iter_mut().find(|(n, _)| *n == nibble) {
            entry.1 = hash;
        } else {
            children.push((nibble, hash));
            children.sort_by_key(|(n, _)| *n);
        }
        children
    }
}
