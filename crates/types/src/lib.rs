//! Core data structures and error types for the jarnet transaction engine.
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

pub mod codec;
pub mod config;
pub mod error;
pub mod gas;
pub mod reference;
pub mod request;
pub mod response;
pub mod update;
pub mod value;

pub mod prelude {
    pub use crate::codec::{from_bytes_canonical, to_bytes_canonical};
    pub use crate::error::{ErrorCode, StateError, StoreError, TransactionError};
    pub use crate::gas::GasCosts;
    pub use crate::reference::{StateId, StorageReference, TransactionReference};
    pub use crate::request::TransactionRequest;
    pub use crate::response::{Outcome, TransactionResponse};
    pub use crate::update::Update;
    pub use crate::value::{ClassType, FieldSignature, StorageType, StorageValue};
}
