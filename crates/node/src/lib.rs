// Path: crates/node/src/lib.rs
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

//! The node façade (spec.md §2 C11): wires a [`jarnet_types::config::NodeConfig`]
//! into a running [`jarnet_abci::RpcContext`], and exposes the public API a
//! client talks to — submit a request, poll for its response, subscribe to
//! delivery events — over an internal block-production loop that stands in
//! for the external consensus engine spec.md places out of scope.

pub mod api;
pub mod bootstrap;
pub mod driver;
pub mod events;
pub mod queue;

pub use api::Node;
pub use bootstrap::build_context;
pub use events::{DeliveryEvent, EventBus};
pub use queue::RequestQueue;
