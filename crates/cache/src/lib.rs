// Path: crates/cache/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! The LRU cache layer (spec.md §4.10, C10): checked-signature and
//! class-loader memos plus the per-store consensus/gas-price/inflation
//! fields, all invalidated via the typed event predicates in [`events`].

pub mod classloaders;
pub mod events;
pub mod ring;
pub mod signatures;
pub mod versioned;

pub use classloaders::ClassLoaderCache;
pub use events::{events_of, invalidated_caches, CacheEvent, InvalidationRule, TrustedCreators, ALL_RULES, CONSENSUS_RULE, GAS_PRICE_RULE, INFLATION_RULE};
pub use signatures::{SignatureCache, SignatureCacheKey};
pub use versioned::Versioned;

use jarnet_types::update::Update;

/// Bundles every cache a store handle needs, along with the trusted-creator
/// set its invalidation rules are checked against (spec.md §4.10). Held on
/// the store handle and passed explicitly, never as a process-wide
/// singleton (spec.md REDESIGN FLAGS: "no global mutable state for
/// consensus/gas caches").
pub struct CacheLayer<C, G, I> {
    pub signatures: SignatureCache,
    pub class_loaders: ClassLoaderCache,
    pub consensus: Versioned<C>,
    pub gas_price: Versioned<G>,
    pub inflation: Versioned<I>,
    trusted: TrustedCreators,
}

impl<C: Clone, G: Clone, I: Clone> CacheLayer<C, G, I> {
    pub fn new(signature_capacity: usize, class_loader_capacity: usize, trusted: TrustedCreators) -> Self {
        Self {
            signatures: SignatureCache::new(signature_capacity),
            class_loaders: ClassLoaderCache::new(class_loader_capacity),
            consensus: Versioned::new("consensus"),
            gas_price: Versioned::new("gas_price"),
            inflation: Versioned::new("inflation"),
            trusted,
        }
    }

    /// Inspects one delivered response's updates and invalidates whichever
    /// of `consensus`/`gas_price`/`inflation` its trusted events name
    /// (spec.md §4.8: "decides whether cached consensus, gas-price or
    /// inflation must be recomputed ... If so, subsequent transactions in
    /// the same block see the updated cache via a re-read from store").
    pub fn observe_updates(&self, updates: &[Update]) {
        let events = events_of(updates);
        if events.is_empty() {
            return;
        }
        let hit = invalidated_caches(&events, &self.trusted);
        if hit.contains(CONSENSUS_RULE.cache) {
            self.consensus.invalidate();
        }
        if hit.contains(GAS_PRICE_RULE.cache) {
            self.gas_price.invalidate();
        }
        if hit.contains(INFLATION_RULE.cache) {
            self.inflation.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarnet_types::reference::TransactionReference;
    use jarnet_types::value::ClassType;

    #[test]
    fn observing_a_trusted_gas_price_event_invalidates_only_gas_price() {
        let manifest = TransactionReference::new([1u8; 32]);
        let layer: CacheLayer<u8, u64, u64> = CacheLayer::new(8, 8, TrustedCreators::new([manifest]));
        assert_eq!(layer.gas_price.get_or_compute(|| 5), 5);
        assert_eq!(layer.consensus.get_or_compute(|| 7u8), 7);

        let object = jarnet_types::reference::StorageReference::new(manifest, 0);
        let updates = vec![Update::ClassTag { object, class_type: ClassType::new("GasPriceUpdateEvent") }];
        layer.observe_updates(&updates);

        assert_eq!(layer.gas_price.get_or_compute(|| 9), 9, "invalidated, so recomputed");
        assert_eq!(layer.consensus.get_or_compute(|| 42u8), 7, "untouched, so still cached");
    }
}
