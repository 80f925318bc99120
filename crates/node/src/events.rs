// Path: crates/node/src/events.rs
//! Event subscription over committed transactions (spec.md §2 C11: "event
//! subscription"), following the teacher's `tokio::sync::broadcast` idiom
//! for fan-out notification (`src/bin/ioi-local.rs`).

use jarnet_types::reference::TransactionReference;
use tokio::sync::broadcast;

/// What a subscriber learns about a delivered request once its containing
/// block commits.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub reference: TransactionReference,
    pub accepted: bool,
    pub height: u64,
}

/// A multi-producer, multi-consumer fan-out of [`DeliveryEvent`]s. Lagging
/// subscribers drop the oldest events rather than blocking the commit path;
/// callers that need every event should poll the store directly instead.
pub struct EventBus {
    sender: broadcast::Sender<DeliveryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event; a channel with no subscribers simply drops it.
    pub fn publish(&self, event: DeliveryEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_subscriber_observes_a_published_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(DeliveryEvent { reference: TransactionReference::new([7; 32]), accepted: true, height: 1 });

        let got = rx.recv().await.expect("event");
        assert_eq!(got.reference, TransactionReference::new([7; 32]));
        assert!(got.accepted);
        assert_eq!(got.height, 1);
    }

    #[test]
    fn publishing_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.publish(DeliveryEvent { reference: TransactionReference::new([1; 32]), accepted: false, height: 0 });
    }
}
