// Path: crates/abci/src/block.rs
//! Per-block scratch state opened at `beginBlock` and consumed at `commit`
//! (spec.md §4.9, §4 Invariants: "within a block, transactions are
//! committed in the order they were delivered").

use crate::validator::ValidatorEntry;
use jarnet_engine::BlockTotals;
use jarnet_store::StoreTransformation;
use std::collections::BTreeSet;

pub struct BlockState {
    pub transformation: StoreTransformation,
    pub totals: BlockTotals,
    pub time: u64,
    pub behaving: BTreeSet<[u8; 32]>,
    pub misbehaving: BTreeSet<[u8; 32]>,
    pub validator_snapshot: Vec<ValidatorEntry>,
}

impl BlockState {
    pub fn open(time: u64, behaving: BTreeSet<[u8; 32]>, misbehaving: BTreeSet<[u8; 32]>, validator_snapshot: Vec<ValidatorEntry>) -> Self {
        Self { transformation: StoreTransformation::new(), totals: BlockTotals::default(), time, behaving, misbehaving, validator_snapshot }
    }
}
