// Path: crates/node/src/driver.rs
//! Drives one ABCI block cycle over whatever is currently queued (spec.md
//! §4.9: "consensus -> beginBlock(time) ... for each delivered request ...
//! endBlock diffs validators -> commit").
//!
//! In production the external consensus engine calls these five RPCs over
//! its own gRPC client (spec.md §6, out of this engine's scope); this
//! driver exists so a standalone node — and this crate's own tests — can
//! produce blocks without one, by calling straight through the [`Abci`]
//! trait instead of over a transport.

use crate::events::{DeliveryEvent, EventBus};
use crate::queue::RequestQueue;
use jarnet_abci::{Abci, AbciService, CheckCode, ValidatorEntry};
use jarnet_types::codec::to_bytes_canonical;
use jarnet_types::request::TransactionRequest;
use tonic::Request;

/// How many queued requests one block will attempt to deliver.
const MAX_REQUESTS_PER_BLOCK: usize = 256;

/// Runs `beginBlock` / `deliverTx`* / `endBlock` / `commit` over up to
/// [`MAX_REQUESTS_PER_BLOCK`] requests drained from `queue`, publishing a
/// [`DeliveryEvent`] on `events` for each one. `validators` is reported to
/// `endBlock` as the target set for the next block — a caller not changing
/// membership passes the same set `beginBlock` captured. Returns the
/// committed height, or `Ok(None)` if there was nothing to deliver and no
/// block was produced.
pub async fn run_block(
    service: &AbciService,
    queue: &RequestQueue,
    events: &EventBus,
    time: u64,
    validators: Vec<ValidatorEntry>,
) -> Result<Option<u64>, tonic::Status> {
    let batch = queue.drain(MAX_REQUESTS_PER_BLOCK);
    if batch.is_empty() {
        return Ok(None);
    }

    service
        .begin_block(Request::new(jarnet_abci::messages::BeginBlockRequest { time, evidence: Vec::new(), last_commit_votes: Vec::new() }))
        .await?;

    for request in &batch {
        deliver_one(service, events, request).await?;
    }

    if !validators.is_empty() {
        service.end_block(Request::new(jarnet_abci::messages::EndBlockRequest { validators })).await?;
    }

    service.commit(Request::new(jarnet_abci::messages::CommitRequest)).await?;
    let info = service.info(Request::new(jarnet_abci::messages::InfoRequest)).await?.into_inner();
    Ok(Some(info.height))
}

async fn deliver_one(service: &AbciService, events: &EventBus, request: &TransactionRequest) -> Result<(), tonic::Status> {
    let tx = to_bytes_canonical(request);
    let response = service.deliver_tx(Request::new(jarnet_abci::messages::DeliverTxRequest { tx })).await?.into_inner();
    if let Some(reference) = response.reference {
        events.publish(DeliveryEvent { reference, accepted: response.code == CheckCode::Ok, height: 0 });
    }
    Ok(())
}
