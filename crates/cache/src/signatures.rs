// Path: crates/cache/src/signatures.rs
//! `checkedSignatures[SignedRequest] -> Boolean` (spec.md §4.10): a memo of
//! whether a given signed-request digest has already been found valid, so a
//! request replayed across blocks (or re-checked during mempool/consensus
//! overlap) doesn't re-run the scheme's verification.

use crate::ring::BoundedCache;

/// Identifies one signed request for memoization purposes: the digest of its
/// signing bytes plus its signature, not the request itself (signatures are
/// checked once per distinct `(body, signature)` pair, never per content).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignatureCacheKey(pub [u8; 32]);

pub struct SignatureCache {
    entries: BoundedCache<SignatureCacheKey, bool>,
}

impl SignatureCache {
    pub fn new(capacity: usize) -> Self {
        Self { entries: BoundedCache::new(capacity) }
    }

    /// Returns the memoized verdict for `key` if present; otherwise runs
    /// `verify`, records the verdict, and returns it.
    pub fn check_or_verify(&self, key: SignatureCacheKey, verify: impl FnOnce() -> bool) -> bool {
        let metrics = jarnet_telemetry::sinks::cache_metrics();
        if let Some(valid) = self.entries.get(&key) {
            metrics.inc_hit("checked_signatures");
            return valid;
        }
        metrics.inc_miss("checked_signatures");
        let valid = verify();
        self.entries.insert(key, valid);
        valid
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        jarnet_telemetry::sinks::cache_metrics().inc_invalidation("checked_signatures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn verify_runs_once_per_key() {
        let cache = SignatureCache::new(8);
        let calls = Cell::new(0);
        let key = SignatureCacheKey([1u8; 32]);
        assert!(cache.check_or_verify(key, || {
            calls.set(calls.get() + 1);
            true
        }));
        assert!(cache.check_or_verify(key, || {
            calls.set(calls.get() + 1);
            true
        }));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_keys_are_verified_independently() {
        let cache = SignatureCache::new(8);
        assert!(!cache.check_or_verify(SignatureCacheKey([2u8; 32]), || false));
        assert!(cache.check_or_verify(SignatureCacheKey([3u8; 32]), || true));
    }
}
