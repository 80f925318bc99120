// Path: crates/vm/src/lib.rs
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

//! The class loader, object serializer and gas engine (spec.md §4.4-§4.6,
//! C4/C5/C6): these have no direct bytecode-runtime analogue to adapt from,
//! so they are built as plain idiomatic Rust over the object model in
//! `jarnet-types` and the trie facade in `jarnet-store`.

pub mod classloader;
pub mod gas;
pub mod serde_objects;
pub mod verifier;

pub use classloader::{ClassLoader, ClassLoaderLimits};
pub use gas::{ChargeReceipt, GasMeter, RedGreenBalance};
pub use serde_objects::{DeserializedObject, LiveValue};
pub use verifier::{ClassDeclaration, DeterministicVerifier, JarManifest, JarVerifier};
