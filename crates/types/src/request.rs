//! `TransactionRequest` (spec.md §3-§4.7): the seven request kinds accepted
//! by the engine, plus the canonical signing-bytes helper.

use crate::codec::to_bytes_canonical;
use crate::reference::{StorageReference, TransactionReference};
use crate::value::{ClassType, StorageValue};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The set of jar transaction references forming the roots of a dependency
/// DAG used to resolve classes for a request (spec.md GLOSSARY).
#[derive(Clone, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize, Debug, Default)]
pub struct Classpath(pub Vec<TransactionReference>);

impl Classpath {
    pub fn new(roots: Vec<TransactionReference>) -> Self {
        Self(roots)
    }

    pub fn roots(&self) -> &[TransactionReference] {
        &self.0
    }
}

/// Fields common to every non-initial request, carried verbatim by each
/// variant below (spec.md §3: "Non-initial requests carry (caller, nonce,
/// chainId, gasLimit, gasPrice, classpath, signature)").
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct CommonFields {
    pub caller: StorageReference,
    pub nonce: u64,
    pub chain_id: String,
    pub gas_limit: u128,
    pub gas_price: u128,
    pub classpath: Classpath,
    /// Empty until the request is signed; excluded from the signed byte
    /// serialization (see [`TransactionRequest::bytes_to_sign`]).
    pub signature: Vec<u8>,
}

/// A fully qualified constructor or method signature: declaring class,
/// member name (empty for constructors) and formal parameter types.
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct MemberSignature {
    pub defining_class: ClassType,
    pub method_name: String,
    pub formals: Vec<ClassType>,
}

#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug, Default)]
pub struct ActualArguments(pub Vec<ActualArgument>);

/// An actual argument passed to a constructor/method call. Storage-typed
/// arguments carry a [`StorageValue`]; this is a thin wire wrapper so
/// `TransactionRequest` does not need to depend on the VM crate.
#[derive(Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize, Debug)]
pub struct ActualArgument(pub StorageValue);

/// The seven request kinds of spec.md §3/§4.7.
#[derive(Clone, PartialEq, Encode, Decode, Serialize, Deserialize, Debug)]
pub enum TransactionRequest {
    /// Installs a jar with no dependencies at genesis time; unsigned, costs
    /// no gas, and is the only request whose reference is `H(body)` without
    /// a trailing signature.
    JarStoreInitial { jar_bytes: Vec<u8> },
    /// Creates the distinguished gamete account; unsigned, no gas.
    GameteCreation {
        classpath: Classpath,
        initial_amount: Vec<u8>,
        public_key: Vec<u8>,
    },
    /// Sets the manifest storage reference, marking the node initialized;
    /// unsigned, no gas.
    Initialization {
        classpath: Classpath,
        manifest: StorageReference,
    },
    /// Installs a jar with a classpath of dependencies.
    JarStore {
        common: CommonFields,
        jar_bytes: Vec<u8>,
        dependencies: Vec<TransactionReference>,
    },
    /// Instantiates a new object via the given constructor.
    ConstructorCall {
        common: CommonFields,
        constructor: MemberSignature,
        actuals: ActualArguments,
    },
    /// Invokes an instance method on `receiver`.
    InstanceMethodCall {
        common: CommonFields,
        method: MemberSignature,
        receiver: StorageReference,
        actuals: ActualArguments,
        /// Read-only calls bypass nonce/chain-id checks and are discarded.
        view: bool,
    },
    /// Invokes a static method; no receiver.
    StaticMethodCall {
        common: CommonFields,
        method: MemberSignature,
        actuals: ActualArguments,
        view: bool,
    },
}

impl TransactionRequest {
    pub fn common(&self) -> Option<&CommonFields> {
        match self {
            Self::JarStoreInitial { .. } | Self::GameteCreation { .. } | Self::Initialization { .. } => None,
            Self::JarStore { common, .. }
            | Self::ConstructorCall { common, .. }
            | Self::InstanceMethodCall { common, .. }
            | Self::StaticMethodCall { common, .. } => Some(common),
        }
    }

    /// Whether this request is one of the two unsigned bootstrap requests
    /// that incur no gas accounting (spec.md §4.5).
    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            Self::JarStoreInitial { .. } | Self::GameteCreation { .. } | Self::Initialization { .. }
        )
    }

    pub fn is_view(&self) -> bool {
        match self {
            Self::InstanceMethodCall { view, .. } | Self::StaticMethodCall { view, .. } => *view,
            _ => false,
        }
    }

    /// The canonical byte serialization signed over by non-initial
    /// requests: the request with its `signature` field zeroed out, so the
    /// signature itself never enters the signed bytes (spec.md §3, §6.2).
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        if let Some(common) = unsigned.common_mut() {
            common.signature.clear();
        }
        to_bytes_canonical(&unsigned)
    }

    fn common_mut(&mut self) -> Option<&mut CommonFields> {
        match self {
            Self::JarStoreInitial { .. } | Self::GameteCreation { .. } | Self::Initialization { .. } => None,
            Self::JarStore { common, .. }
            | Self::ConstructorCall { common, .. }
            | Self::InstanceMethodCall { common, .. }
            | Self::StaticMethodCall { common, .. } => Some(common),
        }
    }

    /// The canonical bytes identifying this request, used as input to
    /// `H(...)` when computing its [`TransactionReference`]. Initial
    /// requests hash their full body; signed requests hash body + signature
    /// (spec.md §6.2: "H(body_without_signature || signature)").
    pub fn bytes_for_hashing(&self) -> Vec<u8> {
        if self.is_initial() {
            return to_bytes_canonical(self);
        }
        let mut bytes = self.bytes_to_sign();
        if let Some(common) = self.common() {
            bytes.extend_from_slice(&common.signature);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_common() -> CommonFields {
        CommonFields {
            caller: StorageReference::new(TransactionReference::new([1u8; 32]), 0),
            nonce: 0,
            chain_id: "test".to_string(),
            gas_limit: 100_000,
            gas_price: 1,
            classpath: Classpath::new(vec![TransactionReference::new([2u8; 32])]),
            signature: vec![],
        }
    }

    #[test]
    fn signing_bytes_exclude_signature() {
        let mut req = TransactionRequest::StaticMethodCall {
            common: sample_common(),
            method: MemberSignature {
                defining_class: ClassType::new("C"),
                method_name: "m".to_string(),
                formals: vec![],
            },
            actuals: ActualArguments::default(),
            view: false,
        };
        let before = req.bytes_to_sign();
        if let TransactionRequest::StaticMethodCall { common, .. } = &mut req {
            common.signature = vec![9, 9, 9];
        }
        let after = req.bytes_to_sign();
        assert_eq!(before, after, "signature must not affect signed bytes");
    }

    #[test]
    fn hashing_bytes_include_signature_for_non_initial() {
        let mut req = TransactionRequest::StaticMethodCall {
            common: sample_common(),
            method: MemberSignature {
                defining_class: ClassType::new("C"),
                method_name: "m".to_string(),
                formals: vec![],
            },
            actuals: ActualArguments::default(),
            view: false,
        };
        let without_sig = req.bytes_for_hashing();
        if let TransactionRequest::StaticMethodCall { common, .. } = &mut req {
            common.signature = vec![9, 9, 9];
        }
        let with_sig = req.bytes_for_hashing();
        assert_ne!(without_sig, with_sig);
    }

    #[test]
    fn initial_requests_have_no_common_fields() {
        let req = TransactionRequest::JarStoreInitial {
            jar_bytes: vec![1, 2, 3],
        };
        assert!(req.is_initial());
        assert!(req.common().is_none());
    }
}
