// Path: crates/abci/src/messages.rs
//! Plain request/response payloads for the seven ABCI callbacks (spec.md
//! §4.9). Hand-rolled rather than `prost`-generated: this bridge runs
//! in-process between `jarnet-node` and the external consensus engine's own
//! gRPC client, so there is no independent wire schema of this bridge's own
//! to generate from a `.proto` here.

use crate::codes::CheckCode;
use crate::validator::{ValidatorEntry, ValidatorUpdate};
use jarnet_types::reference::TransactionReference;

#[derive(Debug, Clone, Default)]
pub struct InitChainRequest {
    pub chain_id: String,
    pub genesis_time: u64,
}

#[derive(Debug, Clone, Default)]
pub struct InitChainResponse {
    pub validators: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, Default)]
pub struct InfoRequest;

#[derive(Debug, Clone)]
pub struct InfoResponse {
    pub height: u64,
    pub app_hash: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CheckTxRequest {
    pub tx: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct CheckTxResponse {
    pub code: CheckCode,
    pub message: String,
}

/// Whether a validator signed the immediately preceding block, as reported
/// by the consensus engine at `beginBlock` (spec.md §4.9: "capture
/// behaving/misbehaving address sets").
#[derive(Debug, Clone, Copy, Default)]
pub struct VoteInfo {
    pub validator: [u8; 32],
    pub signed_last_block: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BeginBlockRequest {
    pub time: u64,
    pub evidence: Vec<[u8; 32]>,
    pub last_commit_votes: Vec<VoteInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct BeginBlockResponse;

#[derive(Debug, Clone)]
pub struct DeliverTxRequest {
    pub tx: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct DeliverTxResponse {
    pub code: CheckCode,
    pub message: String,
    pub reference: Option<TransactionReference>,
}

#[derive(Debug, Clone, Default)]
pub struct EndBlockRequest {
    pub validators: Vec<ValidatorEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct EndBlockResponse {
    pub validator_updates: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitRequest;

#[derive(Debug, Clone)]
pub struct CommitResponse {
    pub app_hash: Vec<u8>,
}
