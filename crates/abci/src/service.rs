// Path: crates/abci/src/service.rs
//! The seven ABCI callbacks (spec.md §4.9), sequenced onto one
//! [`BlockState`] per block. Follows the teacher's
//! `#[tonic::async_trait] impl ... for ...Impl<...> { ctx: Arc<RpcContext<...>> }`
//! shape (`validator::standard::workload::ipc::grpc_control`), minus the
//! generic commitment-scheme parameters that pattern carries for a chain
//! state backend this bridge doesn't have.

use crate::block::BlockState;
use crate::codes::CheckCode;
use crate::context::RpcContext;
use crate::messages::{
    BeginBlockRequest, BeginBlockResponse, CheckTxRequest, CheckTxResponse, CommitRequest, CommitResponse, DeliverTxRequest, DeliverTxResponse,
    EndBlockRequest, EndBlockResponse, InfoRequest, InfoResponse, InitChainRequest, InitChainResponse,
};
use crate::validator::diff_validators;
use jarnet_cache::SignatureCacheKey;
use jarnet_crypto::hash::sha256;
use jarnet_engine::{decode_account_fields, nonce_field, public_key_field, BuildContext, DeliveryOutcome};
use jarnet_store::Store;
use jarnet_types::codec::{from_bytes_canonical, to_bytes_canonical};
use jarnet_types::request::TransactionRequest;
use jarnet_types::value::StorageValue;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tonic::{async_trait, Request, Response, Status};

#[async_trait]
pub trait Abci {
    async fn init_chain(&self, request: Request<InitChainRequest>) -> Result<Response<InitChainResponse>, Status>;
    async fn info(&self, request: Request<InfoRequest>) -> Result<Response<InfoResponse>, Status>;
    async fn check_tx(&self, request: Request<CheckTxRequest>) -> Result<Response<CheckTxResponse>, Status>;
    async fn begin_block(&self, request: Request<BeginBlockRequest>) -> Result<Response<BeginBlockResponse>, Status>;
    async fn deliver_tx(&self, request: Request<DeliverTxRequest>) -> Result<Response<DeliverTxResponse>, Status>;
    async fn end_block(&self, request: Request<EndBlockRequest>) -> Result<Response<EndBlockResponse>, Status>;
    async fn commit(&self, request: Request<CommitRequest>) -> Result<Response<CommitResponse>, Status>;
}

pub struct AbciService {
    ctx: Arc<RpcContext>,
    block: Mutex<Option<BlockState>>,
}

impl AbciService {
    pub fn new(ctx: Arc<RpcContext>) -> Self {
        Self { ctx, block: Mutex::new(None) }
    }
}

fn decode_request(bytes: &[u8]) -> Result<TransactionRequest, Status> {
    from_bytes_canonical(bytes).map_err(|e| Status::invalid_argument(format!("malformed request: {e}")))
}

/// The cheap `checkRequest` validation spec.md §4.9 names: signature,
/// nonce, min-gas-required, run against a snapshot rather than the full
/// per-field gas/charge bookkeeping `jarnet_engine`'s builders do for an
/// actually-delivered request.
fn check_request(ctx: &RpcContext, store: &Store, request: &TransactionRequest) -> Result<(), String> {
    let Some(common) = request.common() else {
        return Ok(());
    };
    if request.is_view() {
        return Ok(());
    }

    let caller_fields = decode_account_fields(store, &common.caller).map_err(|e| e.to_string())?;
    let public_key = match caller_fields.get(&public_key_field()) {
        Some(StorageValue::String(s)) => hex::decode(s).unwrap_or_default(),
        _ => Vec::new(),
    };

    let signing_bytes = request.bytes_to_sign();
    let digest = sha256([signing_bytes.as_slice(), common.signature.as_slice()].concat());
    let scheme = ctx.scheme.as_ref();
    let valid = ctx
        .cache
        .signatures
        .check_or_verify(SignatureCacheKey(digest), || scheme.verify(&public_key, &signing_bytes, &common.signature).is_ok());
    if !valid {
        return Err("invalid signature".to_string());
    }

    let caller_nonce = match caller_fields.get(&nonce_field()) {
        Some(StorageValue::Long(n)) => *n,
        _ => 0,
    };
    if common.nonce != caller_nonce as u64 {
        return Err(format!("nonce mismatch: expected {caller_nonce}, got {}", common.nonce));
    }

    let min_gas = 10 + to_bytes_canonical(request).len() as u128;
    if common.gas_limit < min_gas {
        return Err(format!("gas limit {} below minimum required {min_gas}", common.gas_limit));
    }

    Ok(())
}

#[async_trait]
impl Abci for AbciService {
    /// No-op (spec.md §4.9: "initChain: no-op, returns empty validator
    /// set") — the manifest's own `Initialization` request is what actually
    /// seeds the validator set, not this callback.
    async fn init_chain(&self, _request: Request<InitChainRequest>) -> Result<Response<InitChainResponse>, Status> {
        Ok(Response::new(InitChainResponse { validators: Vec::new() }))
    }

    async fn info(&self, _request: Request<InfoRequest>) -> Result<Response<InfoResponse>, Status> {
        let store = self.ctx.head.snapshot();
        let height = store.height().map_err(|e| Status::internal(e.to_string()))?;
        Ok(Response::new(InfoResponse { height, app_hash: store.state_id().to_bytes().to_vec() }))
    }

    async fn check_tx(&self, request: Request<CheckTxRequest>) -> Result<Response<CheckTxResponse>, Status> {
        let req = request.into_inner();
        let store = self.ctx.head.snapshot();
        let parsed = match decode_request(&req.tx) {
            Ok(parsed) => parsed,
            Err(status) => return Ok(Response::new(CheckTxResponse { code: CheckCode::Error, message: status.message().to_string() })),
        };
        match check_request(&self.ctx, &store, &parsed) {
            Ok(()) => Ok(Response::new(CheckTxResponse { code: CheckCode::Ok, message: String::new() })),
            Err(reason) => Ok(Response::new(CheckTxResponse { code: CheckCode::Rejected, message: reason })),
        }
    }

    async fn begin_block(&self, request: Request<BeginBlockRequest>) -> Result<Response<BeginBlockResponse>, Status> {
        let req = request.into_inner();
        let behaving: BTreeSet<[u8; 32]> = req.last_commit_votes.iter().filter(|v| v.signed_last_block).map(|v| v.validator).collect();
        let misbehaving: BTreeSet<[u8; 32]> = req.last_commit_votes.iter().filter(|v| !v.signed_last_block).map(|v| v.validator).collect();
        let snapshot = self.ctx.validators.current();

        let mut block = self.block.lock().unwrap_or_else(|p| p.into_inner());
        *block = Some(BlockState::open(req.time, behaving, misbehaving, snapshot));
        Ok(Response::new(BeginBlockResponse))
    }

    async fn deliver_tx(&self, request: Request<DeliverTxRequest>) -> Result<Response<DeliverTxResponse>, Status> {
        let req = request.into_inner();
        let parsed = match decode_request(&req.tx) {
            Ok(parsed) => parsed,
            Err(status) => {
                return Ok(Response::new(DeliverTxResponse { code: CheckCode::Error, message: status.message().to_string(), reference: None }))
            }
        };

        let store = self.ctx.head.snapshot();
        let mut block_guard = self.block.lock().unwrap_or_else(|p| p.into_inner());
        let Some(block) = block_guard.as_mut() else {
            return Ok(Response::new(DeliverTxResponse {
                code: CheckCode::Error,
                message: "deliverTx called before beginBlock".into(),
                reference: None,
            }));
        };

        let gas_price_floor = self.ctx.cache.gas_price.get_or_compute(|| self.ctx.config.initial_gas_price);
        let build_ctx = BuildContext::new(&store, &self.ctx.config, self.ctx.scheme.as_ref(), self.ctx.verifier.as_ref(), self.ctx.runtime.as_ref())
            .with_gas_price_floor(gas_price_floor);
        match jarnet_engine::deliver(&build_ctx, &parsed, &mut block.transformation, &mut block.totals) {
            DeliveryOutcome::Accepted { reference, response } => {
                self.ctx.cache.observe_updates(&response.updates);
                Ok(Response::new(DeliverTxResponse { code: CheckCode::Ok, message: String::new(), reference: Some(reference) }))
            }
            DeliveryOutcome::Rejected { reference, reason } => {
                Ok(Response::new(DeliverTxResponse { code: CheckCode::Rejected, message: reason, reference: Some(reference) }))
            }
        }
    }

    async fn end_block(&self, request: Request<EndBlockRequest>) -> Result<Response<EndBlockResponse>, Status> {
        let req = request.into_inner();
        let block_guard = self.block.lock().unwrap_or_else(|p| p.into_inner());
        let Some(block) = block_guard.as_ref() else {
            return Err(Status::failed_precondition("endBlock called before beginBlock"));
        };
        let updates = diff_validators(&block.validator_snapshot, &req.validators).map_err(|e| Status::failed_precondition(e.to_string()))?;
        jarnet_telemetry::sinks::abci_metrics().set_validator_set_size(req.validators.len() as f64);
        Ok(Response::new(EndBlockResponse { validator_updates: updates }))
    }

    /// Commits the block's accumulated transformation and advances the head
    /// (spec.md §4.9: "run the reward transaction; compute new state-id;
    /// persist it; advance head"). The reward transaction
    /// (`validators.reward(...)`) is synthesized against the pre-commit
    /// store by [`jarnet_engine::build_reward`] and folded in unless
    /// [`jarnet_engine::is_quiescent_reward`] says it produced nothing but
    /// the manifest-nonce bump.
    async fn commit(&self, _request: Request<CommitRequest>) -> Result<Response<CommitResponse>, Status> {
        let mut block_guard = self.block.lock().unwrap_or_else(|p| p.into_inner());
        let Some(mut block) = block_guard.take() else {
            return Err(Status::failed_precondition("commit called before beginBlock"));
        };
        drop(block_guard);

        let store = self.ctx.head.snapshot();
        if let Some(manifest) = store.get_manifest().map_err(|e| Status::internal(e.to_string()))? {
            let (reward_reference, updates) = jarnet_engine::build_reward(&store, manifest, block.time, &block.totals, &block.behaving);
            if !jarnet_engine::is_quiescent_reward(&updates, "nonce") {
                jarnet_engine::fold_reward(&store, &mut block.transformation, reward_reference, updates);
            }
        }

        let committed = store.commit(block.transformation).map_err(|e| Status::internal(e.to_string()))?;
        let app_hash = committed.state_id().to_bytes().to_vec();
        self.ctx.head.install(committed);

        jarnet_telemetry::sinks::abci_metrics().inc_blocks_committed();
        tracing::debug!(requests = block.totals.number_of_requests, gas = %block.totals.gas_consumed, "committed block");

        Ok(Response::new(CommitResponse { app_hash }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::head::Head;
    use crate::messages::VoteInfo;
    use crate::validator::StaticValidatorSet;
    use jarnet_cache::TrustedCreators;
    use jarnet_crypto::sign::EmptyScheme;
    use jarnet_engine::DefaultRuntime;
    use jarnet_storage::MemoryBackend;
    use jarnet_store::StoreTransformation;
    use jarnet_types::codec::{bigint_to_bytes, to_bytes_canonical};
    use jarnet_types::config::NodeConfig;
    use jarnet_types::reference::TransactionReference;
    use jarnet_types::request::Classpath;
    use jarnet_vm::DeterministicVerifier;

    fn config() -> NodeConfig {
        NodeConfig {
            dir: "/tmp/jarnet".into(),
            max_gas_per_view_transaction: 1_000_000,
            max_polling_attempts: 10,
            polling_delay_millis: 10,
            signature_for_requests: Default::default(),
            allow_unsigned_faucet: false,
            ignore_gas_price: false,
            initial_supply: 1_000_000_000_000_000_000_000,
            final_supply: 2_000_000_000_000_000_000_000,
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
            chain_id: "test".into(),
            genesis_time: 0,
            verification_version: 1,
        }
    }

    fn service() -> AbciService {
        let backend: Arc<dyn jarnet_storage::NodeStoreBackend> = Arc::new(MemoryBackend::new());
        let store = Store::new(backend);
        let mut bootstrap = StoreTransformation::new();
        bootstrap.set_manifest(TransactionReference::new([1u8; 32]));
        let store = store.commit(bootstrap).expect("bootstrap");

        let ctx = RpcContext::new(
            Head::new(store),
            config(),
            Box::new(EmptyScheme),
            Box::new(DeterministicVerifier),
            Box::new(DefaultRuntime),
            Box::new(StaticValidatorSet(vec![])),
            TrustedCreators::new([]),
        );
        AbciService::new(Arc::new(ctx))
    }

    #[tokio::test]
    async fn info_reports_the_initial_head() {
        let svc = service();
        let resp = svc.info(Request::new(InfoRequest)).await.expect("info").into_inner();
        assert_eq!(resp.height, 1, "the bootstrap commit already advanced height once");
    }

    #[tokio::test]
    async fn delivering_a_gamete_creation_across_begin_deliver_commit_advances_height() {
        let svc = service();
        svc.begin_block(Request::new(BeginBlockRequest { time: 0, evidence: vec![], last_commit_votes: vec![] })).await.expect("begin");

        let request = TransactionRequest::GameteCreation {
            classpath: Classpath::new(vec![]),
            initial_amount: bigint_to_bytes(1_000_000_000_000_000_000),
            public_key: vec![1, 2, 3],
        };
        let resp = svc
            .deliver_tx(Request::new(DeliverTxRequest { tx: to_bytes_canonical(&request) }))
            .await
            .expect("deliver")
            .into_inner();
        assert_eq!(resp.code, CheckCode::Ok);
        assert!(resp.reference.is_some());

        let before = svc.ctx.head.snapshot().height().expect("height");
        let commit_resp = svc.commit(Request::new(CommitRequest)).await.expect("commit").into_inner();
        let after = svc.ctx.head.snapshot().height().expect("height");
        assert_eq!(after, before + 1);
        assert_eq!(commit_resp.app_hash.len(), 128);
    }

    #[tokio::test]
    async fn malformed_tx_bytes_report_error_not_panic() {
        let svc = service();
        svc.begin_block(Request::new(BeginBlockRequest { time: 0, evidence: vec![], last_commit_votes: vec![] })).await.expect("begin");
        let resp = svc.deliver_tx(Request::new(DeliverTxRequest { tx: vec![255, 255, 255] })).await.expect("deliver").into_inner();
        assert_eq!(resp.code, CheckCode::Error);
    }

    #[tokio::test]
    async fn end_block_with_no_validators_is_refused() {
        let svc = service();
        svc.begin_block(Request::new(BeginBlockRequest {
            time: 0,
            evidence: vec![],
            last_commit_votes: vec![VoteInfo { validator: [9u8; 32], signed_last_block: true }],
        }))
        .await
        .expect("begin");
        let result = svc.end_block(Request::new(EndBlockRequest { validators: vec![] })).await;
        assert!(result.is_err());
    }
}
