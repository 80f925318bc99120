// Path: crates/telemetry/src/sinks.rs
//! Abstract traits for metrics reporting, decoupling core engine logic from
//! the backend that ultimately renders it (Prometheus, a test recorder, or
//! nothing at all).

use once_cell::sync::OnceCell;

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global [`MetricsSink`] implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns the configured error metrics sink, or a no-op sink if none was installed.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured service (transaction engine) metrics sink, or a no-op sink.
pub fn service_metrics() -> &'static dyn ServiceMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured storage/trie metrics sink, or a no-op sink.
pub fn storage_metrics() -> &'static dyn StorageMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured cache metrics sink, or a no-op sink.
pub fn cache_metrics() -> &'static dyn CacheMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns the configured ABCI bridge metrics sink, or a no-op sink.
pub fn abci_metrics() -> &'static dyn AbciMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// A sink for metrics related to the content-addressed node store and tries (C1).
pub trait StorageMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_nodes_written(&self, count: u64);
    fn inc_bytes_written_total(&self, bytes: u64);
    fn inc_nodes_gced(&self, count: u64);
    fn set_disk_usage_bytes(&self, bytes: u64);
}
impl StorageMetricsSink for NopSink {
    fn inc_nodes_written(&self, _count: u64) {}
    fn inc_bytes_written_total(&self, _bytes: u64) {}
    fn inc_nodes_gced(&self, _count: u64) {}
    fn set_disk_usage_bytes(&self, _bytes: u64) {}
}

/// A sink for metrics related to transaction execution (C7/C8).
pub trait ServiceMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for requests reaching a terminal outcome, labeled
    /// by request kind and outcome (`rejected`/`failed`/`application_exception`/`successful`).
    fn inc_requests_total(&self, request_kind: &'static str, outcome: &'static str);
    /// Observes gas consumed by an accepted request.
    fn observe_gas_consumed(&self, gas: f64);
    /// Observes the wall-clock latency of building a single response.
    fn observe_build_duration(&self, request_kind: &'static str, duration_secs: f64);
}
impl ServiceMetricsSink for NopSink {
    fn inc_requests_total(&self, _request_kind: &'static str, _outcome: &'static str) {}
    fn observe_gas_consumed(&self, _gas: f64) {}
    fn observe_build_duration(&self, _request_kind: &'static str, _duration_secs: f64) {}
}

/// A sink for metrics related to the ABCI consensus bridge (C9).
pub trait AbciMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_blocks_committed(&self);
    fn observe_deliver_tx_duration(&self, duration_secs: f64);
    fn set_validator_set_size(&self, size: f64);
}
impl AbciMetricsSink for NopSink {
    fn inc_blocks_committed(&self) {}
    fn observe_deliver_tx_duration(&self, _duration_secs: f64) {}
    fn set_validator_set_size(&self, _size: f64) {}
}

/// A sink for metrics related to the LRU cache layer (C10).
pub trait CacheMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_hit(&self, cache: &'static str);
    fn inc_miss(&self, cache: &'static str);
    fn inc_invalidation(&self, cache: &'static str);
}
impl CacheMetricsSink for NopSink {
    fn inc_hit(&self, _cache: &'static str) {}
    fn inc_miss(&self, _cache: &'static str) {}
    fn inc_invalidation(&self, _cache: &'static str) {}
}

/// A sink for recording structured error metrics by [`jarnet_types::error::ErrorCode`].
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink implementing every domain-specific trait, giving metrics
/// backends a single point of implementation.
pub trait MetricsSink:
    StorageMetricsSink + ServiceMetricsSink + AbciMetricsSink + CacheMetricsSink + ErrorMetricsSink
{
}

impl<T> MetricsSink for T where
    T: StorageMetricsSink + ServiceMetricsSink + AbciMetricsSink + CacheMetricsSink + ErrorMetricsSink
{
}
