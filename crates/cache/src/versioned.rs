// Path: crates/cache/src/versioned.rs
//! The per-store `consensus`, `gasPrice` and `inflation` caches (spec.md
//! §4.10: "plus per-store fields for `consensus`, `gasPrice`, `inflation`").
//! Unlike [`crate::classloaders::ClassLoaderCache`] or
//! [`crate::signatures::SignatureCache`], these hold at most one value each
//! and are invalidated wholesale — "invalidation flips entire references,
//! never mutates entries in place" (spec.md §4 Invariants).

use std::sync::RwLock;

/// A single cached value, recomputed from the store on the first read after
/// invalidation (or after process start).
pub struct Versioned<T> {
    name: &'static str,
    value: RwLock<Option<T>>,
}

impl<T: Clone> Versioned<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, value: RwLock::new(None) }
    }

    /// Returns the cached value, computing it via `compute` on a miss (first
    /// read, or the first read after [`Self::invalidate`]).
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> T {
        let metrics = jarnet_telemetry::sinks::cache_metrics();
        if let Some(value) = self.value.read().unwrap_or_else(|p| p.into_inner()).as_ref() {
            metrics.inc_hit(self.name);
            return value.clone();
        }
        metrics.inc_miss(self.name);
        let value = compute();
        *self.value.write().unwrap_or_else(|p| p.into_inner()) = Some(value.clone());
        value
    }

    /// Drops the cached value outright rather than updating it in place, so
    /// a concurrent reader never observes a torn intermediate value.
    pub fn invalidate(&self) {
        *self.value.write().unwrap_or_else(|p| p.into_inner()) = None;
        jarnet_telemetry::sinks::cache_metrics().inc_invalidation(self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn recomputes_only_after_invalidation() {
        let cache: Versioned<u64> = Versioned::new("gas_price");
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 1);

        cache.invalidate();
        assert_eq!(cache.get_or_compute(compute), 42);
        assert_eq!(calls.get(), 2);
    }
}
