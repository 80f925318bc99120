// Path: crates/engine/src/lib.rs
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

//! Response builders and the per-request/per-block transaction controller
//! (spec.md §4.7-§4.8, C7/C8), plus the native contract execution seam
//! (spec.md §9) they dispatch into.

pub mod builders;
pub mod controller;
pub mod runtime;

pub use builders::{build_response, BuildContext, BuildOutcome};
pub use controller::{build_reward, deliver, fold_reward, is_quiescent_reward, reference_of, BlockTotals, DeliveryOutcome};
pub use runtime::{account_class, balance_field, decode_account_fields, decode_field, nonce_field, public_key_field, CallContext, ContractRuntime, DefaultRuntime, LiveFields};
