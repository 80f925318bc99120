// Path: crates/node/src/bootstrap.rs
//! Wires a [`NodeConfig`] into a running [`RpcContext`]: picks a storage
//! backend, a signature scheme and the engine's execution seams, the way
//! the teacher's binaries build their `GuardianContainer`/`RpcContext` from
//! a parsed config file before serving (`src/bin/guardian.rs`).

use jarnet_abci::{Head, RpcContext, StaticValidatorSet};
use jarnet_cache::TrustedCreators;
use jarnet_crypto::sign::eddsa::Ed25519Scheme;
use jarnet_crypto::sign::{EmptyScheme, SignatureScheme};
use jarnet_engine::DefaultRuntime;
use jarnet_storage::{NodeStoreBackend, RedbBackend};
use jarnet_store::Store;
use jarnet_types::config::{NodeConfig, SignatureScheme as ConfiguredScheme};
use jarnet_types::error::NodeError;
use jarnet_vm::DeterministicVerifier;
use std::path::Path;
use std::sync::Arc;

/// Picks the concrete [`SignatureScheme`] named by
/// `config.signature_for_requests`. Only `ed25519` and `empty` have a
/// concrete implementation in `jarnet-crypto` today (spec.md §6 also names
/// `ed25519det`/`sha256dsa`/`qtesla1`/`qtesla3`, left as a seam for a
/// dedicated post-quantum crate); any of those fall back to `empty` with a
/// warning rather than failing to start.
fn signature_scheme(config: &NodeConfig) -> Box<dyn SignatureScheme + Send + Sync> {
    match config.signature_for_requests {
        ConfiguredScheme::Ed25519 => Box::new(Ed25519Scheme),
        ConfiguredScheme::Empty => Box::new(EmptyScheme),
        other => {
            tracing::warn!(target: "node", scheme = ?other, "no concrete implementation; falling back to the empty scheme");
            Box::new(EmptyScheme)
        }
    }
}

/// Opens the node's store at `<dir>/store`, creating it if absent.
fn open_store(config: &NodeConfig) -> Result<Store, NodeError> {
    let path = Path::new(&config.dir).join("store");
    let backend = RedbBackend::open(&path).map_err(|e| NodeError::Config(format!("opening store at {}: {e}", path.display())))?;
    let backend: Arc<dyn NodeStoreBackend> = Arc::new(backend);
    Ok(Store::new(backend))
}

/// Builds the shared state every ABCI callback reads from a config.
///
/// The validator set source is always [`StaticValidatorSet`] with no
/// members: a real deployment names validators through a `validators`
/// contract object this engine does not model (see
/// `jarnet_abci::validator::ValidatorSetSource`'s doc comment), so a node
/// built from this function alone is fit for a single-validator dev/test
/// setup until that seam gets a contract-backed implementation.
pub fn build_context(config: NodeConfig) -> Result<RpcContext, NodeError> {
    let store = open_store(&config)?;
    let head = Head::new(store);
    let scheme = signature_scheme(&config);
    let verifier = Box::new(DeterministicVerifier);
    let runtime = Box::new(DefaultRuntime);
    let validators = Box::new(StaticValidatorSet(Vec::new()));
    let trusted = TrustedCreators::new(std::iter::empty());
    Ok(RpcContext::new(head, config, scheme, verifier, runtime, validators, trusted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &str) -> NodeConfig {
        NodeConfig {
            dir: dir.to_string(),
            max_gas_per_view_transaction: 100_000_000,
            max_polling_attempts: 60,
            polling_delay_millis: 1_000,
            signature_for_requests: ConfiguredScheme::Empty,
            allow_unsigned_faucet: true,
            ignore_gas_price: false,
            initial_supply: 1_000_000_000_000,
            final_supply: 2_000_000_000_000,
            initial_red_supply: 0,
            initial_inflation: 0,
            initial_gas_price: 1,
            target_gas_at_reward: 1_000_000,
            oblivion: 250_000,
            max_error_length: 300,
            max_dependencies: 20,
            max_cumulative_size_of_dependencies: 10_000_000,
            ticket_for_new_poll: 100,
            percent_staked: 75,
            buyer_surcharge: 0,
            slashing_for_misbehaving: 1,
            slashing_for_not_behaving: 1,
            chain_id: "test".to_string(),
            genesis_time: 0,
            verification_version: 0,
        }
    }

    #[test]
    fn building_a_context_opens_a_fresh_store_at_height_zero() {
        let dir = tempdir();
        let ctx = build_context(config(dir.path_str())).expect("context");
        assert_eq!(ctx.head.snapshot().height().expect("height"), 0);
    }

    /// A tiny self-deleting temp directory, avoiding a `tempfile` dev-dependency
    /// for a single test.
    struct TempDir(std::path::PathBuf);
    impl TempDir {
        fn path_str(&self) -> &str {
            self.0.to_str().expect("utf8 path")
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
    fn tempdir() -> TempDir {
        let mut path = std::env::temp_dir();
        path.push(format!("jarnet-node-test-{}", std::process::id()));
        let _ = std::fs::create_dir_all(&path);
        TempDir(path)
    }
}
