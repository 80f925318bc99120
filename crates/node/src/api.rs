// Path: crates/node/src/api.rs
//! The node's public API (spec.md §2 C11): submit a request, poll for its
//! response, subscribe to delivery events. Wraps an [`AbciService`] driven
//! in-process by [`driver::run_block`] on a fixed tick, matching the
//! teacher's pattern of a config-driven background loop spawned from
//! `main` (`src/bin/guardian.rs`'s attestation task).

use crate::driver::run_block;
use crate::events::{DeliveryEvent, EventBus};
use crate::queue::RequestQueue;
use jarnet_abci::AbciService;
use jarnet_abci::RpcContext;
use jarnet_types::error::NodeError;
use jarnet_types::reference::TransactionReference;
use jarnet_types::request::TransactionRequest;
use jarnet_types::response::TransactionResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

pub struct Node {
    ctx: Arc<RpcContext>,
    service: AbciService,
    queue: RequestQueue,
    events: EventBus,
}

impl Node {
    pub fn new(ctx: RpcContext) -> Self {
        let ctx = Arc::new(ctx);
        let service = AbciService::new(ctx.clone());
        Self { ctx, service, queue: RequestQueue::new(), events: EventBus::default() }
    }

    /// Enqueues `request`, returning the reference it will be delivered
    /// under so the caller can [`poll_for_response`](Self::poll_for_response) it.
    pub fn submit(&self, request: TransactionRequest) -> TransactionReference {
        self.queue.submit(request)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.events.subscribe()
    }

    /// Drives one block if anything is queued. Exposed for callers that
    /// want to control their own tick (e.g. tests); [`run_forever`](Self::run_forever)
    /// calls this on a fixed interval.
    pub async fn tick(&self, time: u64) -> Result<Option<u64>, tonic::Status> {
        let validators = self.ctx.validators.current();
        run_block(&self.service, &self.queue, &self.events, time, validators).await
    }

    /// Ticks once per `block_period`, producing a block whenever the queue
    /// is non-empty, until `shutdown` resolves.
    pub async fn run_forever(&self, block_period: Duration, shutdown: impl std::future::Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(block_period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let time = std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or(0);
                    match self.tick(time).await {
                        Ok(Some(height)) => tracing::debug!(target: "node", height, "block produced"),
                        Ok(None) => {}
                        Err(status) => tracing::error!(target: "node", error = %status, "block production failed"),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!(target: "node", "shutting down");
                    break;
                }
            }
        }
    }

    /// Polls the store for `reference`'s response, the way spec.md §6's
    /// `maxPollingAttempts`/`pollingDelay` options describe: a bounded
    /// number of attempts spaced `pollingDelayMillis` apart, after which a
    /// still-missing response is reported as [`NodeError::Timeout`].
    pub async fn poll_for_response(&self, reference: TransactionReference) -> Result<TransactionResponse, NodeError> {
        let attempts = self.ctx.config.max_polling_attempts.max(1);
        let delay = Duration::from_millis(self.ctx.config.polling_delay_millis);
        for _ in 0..attempts {
            let store = self.ctx.head.snapshot();
            if let Some(response) = store.get_response(&reference)? {
                return Ok(response);
            }
            sleep(delay).await;
        }
        Err(NodeError::Timeout(reference.to_hex()))
    }
}
