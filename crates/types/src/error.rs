//! Error taxonomy for the jarnet transaction engine.
//!
//! Mirrors the teacher kernel's convention of one `thiserror` enum per
//! concern, each implementing [`ErrorCode`] for a stable machine-readable
//! identifier, with `#[from]` chains linking lower layers into higher ones.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors from the canonical codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "CODEC_ENCODE_FAILED",
            Self::Decode(_) => "CODEC_DECODE_FAILED",
        }
    }
}

/// Errors from the KV / trie layer (C1).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("key not found")]
    KeyNotFound,
    #[error("unknown trie root: {0}")]
    UnknownRoot(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("corrupt trie node: {0}")]
    CorruptNode(String),
    #[error("transaction already committed or aborted")]
    TransactionClosed,
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "STATE_KEY_NOT_FOUND",
            Self::UnknownRoot(_) => "STATE_UNKNOWN_ROOT",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::CorruptNode(_) => "STATE_CORRUPT_NODE",
            Self::TransactionClosed => "STATE_TRANSACTION_CLOSED",
        }
    }
}

/// Errors from the store facade (C3): unknown references surfaced to API callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown transaction reference: {0}")]
    UnknownTransactionReference(String),
    #[error("unknown object: {0}")]
    UnknownObject(String),
    #[error("node not yet initialized (no manifest set)")]
    NotInitialized,
    #[error("node already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    State(#[from] StateError),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTransactionReference(_) => "STORE_UNKNOWN_TX_REF",
            Self::UnknownObject(_) => "STORE_UNKNOWN_OBJECT",
            Self::NotInitialized => "STORE_NOT_INITIALIZED",
            Self::AlreadyInitialized => "STORE_ALREADY_INITIALIZED",
            Self::State(_) => "STORE_STATE_ERROR",
        }
    }
}

/// Errors from the gas engine (C6).
#[derive(Debug, Error)]
pub enum GasError {
    #[error("out of gas")]
    OutOfGas,
    #[error("caller has not enough funds to buy {0} units of gas")]
    InsufficientFundsForGas(u128),
    #[error("gas accounting identity violated: {0}")]
    AccountingViolation(String),
}

impl ErrorCode for GasError {
    fn code(&self) -> &'static str {
        match self {
            Self::OutOfGas => "GAS_OUT_OF_GAS",
            Self::InsufficientFundsForGas(_) => "GAS_INSUFFICIENT_FUNDS",
            Self::AccountingViolation(_) => "GAS_ACCOUNTING_VIOLATION",
        }
    }
}

/// Errors from the class loader (C4).
#[derive(Debug, Error)]
pub enum ClassLoadError {
    #[error("jar not found for transaction reference: {0}")]
    JarNotFound(String),
    #[error("too many dependencies: {got} > {max}")]
    TooManyDependencies { got: usize, max: usize },
    #[error("cumulative dependency size too large: {got} > {max}")]
    CumulativeSizeTooLarge { got: u64, max: u64 },
    #[error("verification failed: {0}")]
    VerificationFailed(String),
    #[error("reverification failed for dependency {index}: {reason}")]
    ReverificationFailed { index: usize, reason: String },
    #[error("class not found: {0}")]
    ClassNotFound(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("field not found: {0}")]
    FieldNotFound(String),
    #[error("call is not white-listed: {0}")]
    NonWhiteListedCall(String),
}

impl ErrorCode for ClassLoadError {
    fn code(&self) -> &'static str {
        match self {
            Self::JarNotFound(_) => "CLASSLOAD_JAR_NOT_FOUND",
            Self::TooManyDependencies { .. } => "CLASSLOAD_TOO_MANY_DEPS",
            Self::CumulativeSizeTooLarge { .. } => "CLASSLOAD_DEPS_TOO_LARGE",
            Self::VerificationFailed(_) => "CLASSLOAD_VERIFICATION_FAILED",
            Self::ReverificationFailed { .. } => "CLASSLOAD_REVERIFICATION_FAILED",
            Self::ClassNotFound(_) => "CLASSLOAD_CLASS_NOT_FOUND",
            Self::MethodNotFound(_) => "CLASSLOAD_METHOD_NOT_FOUND",
            Self::FieldNotFound(_) => "CLASSLOAD_FIELD_NOT_FOUND",
            Self::NonWhiteListedCall(_) => "CLASSLOAD_NON_WHITELISTED_CALL",
        }
    }
}

/// Errors from the serializer/deserializer (C5).
#[derive(Debug, Error)]
pub enum SerdeObjectError {
    #[error("illegal argument: value of class {0} cannot be serialized into storage")]
    IllegalArgument(String),
    #[error("history of object {0} does not cover eager field {1}")]
    MissingEagerField(String, String),
    #[error("class tag not found in history of object {0}")]
    MissingClassTag(String),
    #[error(transparent)]
    ClassLoad(#[from] ClassLoadError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SerdeObjectError {
    fn code(&self) -> &'static str {
        match self {
            Self::IllegalArgument(_) => "SERDE_ILLEGAL_ARGUMENT",
            Self::MissingEagerField(_, _) => "SERDE_MISSING_EAGER_FIELD",
            Self::MissingClassTag(_) => "SERDE_MISSING_CLASS_TAG",
            Self::ClassLoad(_) => "SERDE_CLASSLOAD_ERROR",
            Self::Store(_) => "SERDE_STORE_ERROR",
        }
    }
}

/// The outcome-classification error returned by response builders (C7): the
/// three-way split described in spec.md §4.7 and §9 ("exceptions as control
/// flow" -> tagged sums).
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The request cannot be accepted at all (§7 "Rejected"). No state change
    /// beyond recording the rejection reason.
    #[error("rejected: {0}")]
    Rejected(String),
    /// The request was accepted but the contract threw a declared exception
    /// (§7 "ApplicationException"). Remaining gas is refunded.
    #[error("application exception: {class_name}: {message}")]
    ApplicationException { class_name: String, message: String },
    /// The request was accepted but execution failed for a non-declared or
    /// internal reason (§7 "Failed"). No refund.
    #[error("failed: {class_name}: {message}")]
    Failed { class_name: String, message: String },
    #[error(transparent)]
    Gas(#[from] GasError),
    #[error(transparent)]
    ClassLoad(#[from] ClassLoadError),
    #[error(transparent)]
    SerdeObject(#[from] SerdeObjectError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("signature verification failed")]
    InvalidSignature,
}

impl ErrorCode for TransactionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "TX_REJECTED",
            Self::ApplicationException { .. } => "TX_APPLICATION_EXCEPTION",
            Self::Failed { .. } => "TX_FAILED",
            Self::Gas(_) => "TX_GAS_ERROR",
            Self::ClassLoad(_) => "TX_CLASSLOAD_ERROR",
            Self::SerdeObject(_) => "TX_SERDE_ERROR",
            Self::Store(_) => "TX_STORE_ERROR",
            Self::Codec(_) => "TX_CODEC_ERROR",
            Self::InvalidSignature => "TX_INVALID_SIGNATURE",
        }
    }
}

/// Errors surfaced by the ABCI bridge (C9).
#[derive(Debug, Error)]
pub enum AbciError {
    #[error("malformed request bytes: {0}")]
    Malformed(String),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("validator set would become empty")]
    EmptyValidatorSet,
}

impl ErrorCode for AbciError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "ABCI_MALFORMED_REQUEST",
            Self::Transaction(_) => "ABCI_TX_ERROR",
            Self::Store(_) => "ABCI_STORE_ERROR",
            Self::EmptyValidatorSet => "ABCI_EMPTY_VALIDATOR_SET",
        }
    }
}

/// Node-level errors (C11): configuration, polling and API surface.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error("timed out waiting for response to {0}")]
    Timeout(String),
    #[error("unknown reference: {0}")]
    UnknownReference(String),
}

impl ErrorCode for NodeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "NODE_CONFIG_ERROR",
            Self::Store(_) => "NODE_STORE_ERROR",
            Self::Transaction(_) => "NODE_TRANSACTION_ERROR",
            Self::Timeout(_) => "NODE_TIMEOUT",
            Self::UnknownReference(_) => "NODE_UNKNOWN_REFERENCE",
        }
    }
}

impl From<CodecError> for StoreError {
    fn from(e: CodecError) -> Self {
        StoreError::State(StateError::Backend(e.to_string()))
    }
}
