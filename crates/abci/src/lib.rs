// Path: crates/abci/src/lib.rs
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

//! The consensus-engine bridge (spec.md §4.9, C9): sequences
//! `initChain`/`info`/`checkTx`/`beginBlock`/`deliverTx`/`endBlock`/`commit`
//! onto a store transformation, diffing the validator set at `endBlock` and
//! advancing the head at `commit`.

pub mod block;
pub mod codes;
pub mod context;
pub mod head;
pub mod messages;
pub mod service;
pub mod validator;

pub use codes::CheckCode;
pub use context::RpcContext;
pub use head::Head;
pub use service::{Abci, AbciService};
pub use validator::{diff_validators, StaticValidatorSet, ValidatorEntry, ValidatorSetSource, ValidatorUpdate};
