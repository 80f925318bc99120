// Path: crates/node/src/queue.rs
//! The pending-request queue a submitted transaction sits in until the next
//! block is driven (spec.md §2 C11: "public API, request queue, polling").

use jarnet_engine::reference_of;
use jarnet_types::reference::TransactionReference;
use jarnet_types::request::TransactionRequest;
use std::collections::VecDeque;
use std::sync::Mutex;

/// FIFO of accepted-for-delivery requests, guarded by a single mutex the way
/// `jarnet-abci`'s `BlockState` guards its in-flight transformation.
#[derive(Default)]
pub struct RequestQueue {
    pending: Mutex<VecDeque<TransactionRequest>>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `request` and returns the reference it will be delivered
    /// under, computed the same way the ABCI bridge computes it
    /// (`jarnet_engine::reference_of`) so a caller can poll for the response
    /// before the request has even been picked up by a block.
    pub fn submit(&self, request: TransactionRequest) -> TransactionReference {
        let reference = reference_of(&request);
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).push_back(request);
        reference
    }

    /// Drains up to `max` requests for the next block to deliver.
    pub fn drain(&self, max: usize) -> Vec<TransactionRequest> {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        let n = max.min(pending.len());
        pending.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
        fn gamete_request(seed: u8) -> TransactionRequest {
        TransactionRequest::GameteCreation {
            classpath: jarnet_types::request::Classpath::new(vec![TransactionReference::new([seed; 32])]),
            initial_amount: vec![seed],
            public_key: vec![seed; 32],
        }
    }

    #[test]
    fn submitted_requests_drain_in_fifo_order() {
        let queue = RequestQueue::new();
        let a = gamete_request(1);
        let b = gamete_request(2);
        let ref_a = queue.submit(a.clone());
        let ref_b = queue.submit(b.clone());
        assert_eq!(queue.len(), 2);

        let drained = queue.drain(10);
        assert_eq!(drained.len(), 2);
        assert_eq!(reference_of(&drained[0]), ref_a);
        assert_eq!(reference_of(&drained[1]), ref_b);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_respects_the_max_even_when_more_is_pending() {
        let queue = RequestQueue::new();
        queue.submit(gamete_request(1));
        queue.submit(gamete_request(2));
        queue.submit(gamete_request(3));
        assert_eq!(queue.drain(2).len(), 2);
        assert_eq!(queue.len(), 1);
    }
}
