// Path: crates/abci/src/context.rs
//! Shared state handed to every ABCI callback, following the teacher's
//! `Arc<RpcContext<...>>` pattern
//! (`validator::standard::workload::ipc::grpc_control::WorkloadControlImpl`).

use crate::head::Head;
use crate::validator::ValidatorSetSource;
use jarnet_cache::{CacheLayer, TrustedCreators};
use jarnet_crypto::sign::SignatureScheme;
use jarnet_engine::ContractRuntime;
use jarnet_types::config::NodeConfig;
use jarnet_vm::JarVerifier;

/// Caches the node has no modeled structured type for yet (spec.md §4.10's
/// `consensus`/`gasPrice`/`inflation` fields): `()` for consensus since no
/// consensus-parameters object is decoded anywhere in this crate's scope,
/// `u128` for the other two since that's the numeric type the engine
/// already charges gas in.
pub struct RpcContext {
    pub head: Head,
    pub config: NodeConfig,
    pub scheme: Box<dyn SignatureScheme + Send + Sync>,
    pub verifier: Box<dyn JarVerifier>,
    pub runtime: Box<dyn ContractRuntime>,
    pub validators: Box<dyn ValidatorSetSource>,
    pub cache: CacheLayer<(), u128, u128>,
}

impl RpcContext {
    pub fn new(
        head: Head,
        config: NodeConfig,
        scheme: Box<dyn SignatureScheme + Send + Sync>,
        verifier: Box<dyn JarVerifier>,
        runtime: Box<dyn ContractRuntime>,
        validators: Box<dyn ValidatorSetSource>,
        trusted: TrustedCreators,
    ) -> Self {
        Self { head, config, scheme, verifier, runtime, validators, cache: CacheLayer::new(1024, 256, trusted) }
    }
}
