// Path: crates/storage/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! Content-addressed key-value storage for the jarnet trie layer (C1).
//!
//! [`NodeStoreBackend`] is the seam between the Merkle-Patricia trie
//! implementation in `jarnet-trie` and a concrete persistence engine. Two
//! backends are provided: [`memory::MemoryBackend`] for tests and ephemeral
//! nodes, and [`redb_backend::RedbBackend`] for durable single-process
//! deployments.

pub mod backend;
pub mod error;
pub mod memory;
pub mod redb_backend;

pub use backend::NodeStoreBackend;
pub use error::StorageError;
pub use memory::MemoryBackend;
pub use redb_backend::RedbBackend;
