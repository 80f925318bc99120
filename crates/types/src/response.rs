//! `TransactionResponse` (spec.md §3-§4.7): the per-kind response shapes and
//! the three-way non-rejected outcome classification.

use crate::gas::GasCosts;
use crate::reference::StorageReference;
use crate::update::Update;
use crate::value::StorageValue;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The outcome of an *accepted* request (spec.md §4.7, §7). `Rejected`
/// requests never reach this type: they are recorded separately, keyed on
/// the request's hash, and surfaced directly to the submitter.
#[derive(Clone, PartialEq, Encode, Decode, Serialize, Deserialize, Debug)]
pub enum Outcome {
    /// Execution completed and returned a value.
    Successful { result: Option<StorageValue> },
    /// Execution completed with no return value (void method).
    VoidSuccessful,
    /// The contract threw a declared exception; remaining gas refunded.
    ApplicationException {
        class_name: String,
        message: String,
        where_: String,
    },
    /// Execution failed for a non-declared or internal reason; no refund.
    Failed { class_name: String, message: String },
}

impl Outcome {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful { .. } | Self::VoidSuccessful)
    }

    pub fn is_refunded(&self) -> bool {
        matches!(self, Self::Successful { .. } | Self::VoidSuccessful | Self::ApplicationException { .. })
    }
}

/// The response to an accepted request: the resulting outcome, the updates
/// it produced, events it emitted and gas it consumed.
#[derive(Clone, PartialEq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct TransactionResponse {
    pub outcome: Outcome,
    /// Updates reachable from the request's actuals/caller/result, to be
    /// merged into the responses/histories tries (spec.md §4.2, §4.7).
    pub updates: Vec<Update>,
    /// References of objects representing events emitted up to completion
    /// (or up to the throw point, for `ApplicationException`).
    pub events: Vec<StorageReference>,
    pub gas: GasCosts,
    /// Present for `JarStore`/`JarStoreInitial` responses: the instrumented
    /// jar bytes, its declared dependencies and verification version.
    pub jar_store: Option<JarStoreOutcome>,
}

impl TransactionResponse {
    pub fn successful(result: Option<StorageValue>, updates: Vec<Update>, events: Vec<StorageReference>, gas: GasCosts) -> Self {
        Self {
            outcome: Outcome::Successful { result },
            updates,
            events,
            gas,
            jar_store: None,
        }
    }

    pub fn void_successful(updates: Vec<Update>, events: Vec<StorageReference>, gas: GasCosts) -> Self {
        Self {
            outcome: Outcome::VoidSuccessful,
            updates,
            events,
            gas,
            jar_store: None,
        }
    }

    pub fn application_exception(
        class_name: impl Into<String>,
        message: impl Into<String>,
        where_: impl Into<String>,
        updates: Vec<Update>,
        events: Vec<StorageReference>,
        gas: GasCosts,
    ) -> Self {
        Self {
            outcome: Outcome::ApplicationException {
                class_name: class_name.into(),
                message: message.into(),
                where_: where_.into(),
            },
            updates,
            events,
            gas,
            jar_store: None,
        }
    }

    pub fn failed(
        class_name: impl Into<String>,
        message: impl Into<String>,
        updates: Vec<Update>,
        gas: GasCosts,
    ) -> Self {
        Self {
            outcome: Outcome::Failed {
                class_name: class_name.into(),
                message: message.into(),
            },
            updates,
            events: vec![],
            gas,
            jar_store: None,
        }
    }
}

/// The jar-specific portion of a successful `JarStore`/`JarStoreInitial`
/// response: the verified, instrumented bytes and resolved dependency set.
#[derive(Clone, PartialEq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct JarStoreOutcome {
    pub instrumented_jar: Vec<u8>,
    pub dependencies: Vec<StorageReference>,
    pub verification_version: u32,
}

/// The reason a request was rejected, keyed on `hash(request)` and never
/// entering the tries (spec.md §7 "Rejected").
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct RejectionReason(pub String);

/// A loaded class's runtime tag used inside [`Outcome::ApplicationException`]
/// to identify the `NonWhiteListedCallException`-style causes (spec.md §9
/// scenario 5); kept here for re-export convenience.
pub const NON_WHITE_LISTED_CALL_EXCEPTION: &str = "NonWhiteListedCallException";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_successful_is_refunded_and_successful() {
        let r = TransactionResponse::void_successful(vec![], vec![], GasCosts::zero());
        assert!(r.outcome.is_successful());
        assert!(r.outcome.is_refunded());
    }

    #[test]
    fn failed_is_not_refunded() {
        let r = TransactionResponse::failed("Boom", "oops", vec![], GasCosts::zero());
        assert!(!r.outcome.is_successful());
        assert!(!r.outcome.is_refunded());
    }

    #[test]
    fn application_exception_is_refunded_not_successful() {
        let r = TransactionResponse::application_exception("E", "m", "at X", vec![], vec![], GasCosts::zero());
        assert!(!r.outcome.is_successful());
        assert!(r.outcome.is_refunded());
    }
}
