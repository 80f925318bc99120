// Path: crates/abci/src/head.rs
//! The node's current committed [`Store`], swapped atomically at `commit`
//! (spec.md §4.9: "persist it; advance head").

use jarnet_store::Store;
use std::sync::RwLock;

pub struct Head {
    current: RwLock<Store>,
}

impl Head {
    pub fn new(store: Store) -> Self {
        Self { current: RwLock::new(store) }
    }

    /// A read-only snapshot of the current head, safe to hold across an
    /// entire call without blocking concurrent commits (spec.md §4.8:
    /// "read-only calls ... each such call takes a fresh snapshot at entry
    /// and sees a consistent view for its entire duration").
    pub fn snapshot(&self) -> Store {
        self.current.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn install(&self, next: Store) {
        *self.current.write().unwrap_or_else(|p| p.into_inner()) = next;
    }
}
