// Path: crates/telemetry/src/prometheus_sink.rs
//! A concrete implementation of the metrics sinks using the `prometheus` crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_histogram_vec,
    register_int_counter, register_int_counter_vec, Gauge, Histogram, HistogramVec, IntCounter,
    IntCounterVec,
};

static STORAGE_NODES_WRITTEN_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_BYTES_WRITTEN_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_NODES_GCED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_DISK_USAGE_BYTES: OnceCell<Gauge> = OnceCell::new();

static REQUESTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static GAS_CONSUMED: OnceCell<Histogram> = OnceCell::new();
static BUILD_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();

static BLOCKS_COMMITTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static DELIVER_TX_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();
static VALIDATOR_SET_SIZE: OnceCell<Gauge> = OnceCell::new();

static CACHE_HITS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CACHE_MISSES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CACHE_INVALIDATIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Reads a registered metric. Panics only if `install()` was never called,
/// which is a programmer error in application setup, not a runtime condition.
macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("prometheus sink not initialized: call telemetry::prometheus_sink::install() first")
    };
}

impl StorageMetricsSink for PrometheusSink {
    fn inc_nodes_written(&self, count: u64) {
        get_metric!(STORAGE_NODES_WRITTEN_TOTAL).inc_by(count);
    }
    fn inc_bytes_written_total(&self, bytes: u64) {
        get_metric!(STORAGE_BYTES_WRITTEN_TOTAL).inc_by(bytes);
    }
    fn inc_nodes_gced(&self, count: u64) {
        get_metric!(STORAGE_NODES_GCED_TOTAL).inc_by(count);
    }
    fn set_disk_usage_bytes(&self, bytes: u64) {
        get_metric!(STORAGE_DISK_USAGE_BYTES).set(bytes as f64);
    }
}

impl ServiceMetricsSink for PrometheusSink {
    fn inc_requests_total(&self, request_kind: &'static str, outcome: &'static str) {
        get_metric!(REQUESTS_TOTAL)
            .with_label_values(&[request_kind, outcome])
            .inc();
    }
    fn observe_gas_consumed(&self, gas: f64) {
        get_metric!(GAS_CONSUMED).observe(gas);
    }
    fn observe_build_duration(&self, request_kind: &'static str, duration_secs: f64) {
        get_metric!(BUILD_DURATION_SECONDS)
            .with_label_values(&[request_kind])
            .observe(duration_secs);
    }
}

impl AbciMetricsSink for PrometheusSink {
    fn inc_blocks_committed(&self) {
        get_metric!(BLOCKS_COMMITTED_TOTAL).inc();
    }
    fn observe_deliver_tx_duration(&self, duration_secs: f64) {
        get_metric!(DELIVER_TX_DURATION_SECONDS).observe(duration_secs);
    }
    fn set_validator_set_size(&self, size: f64) {
        get_metric!(VALIDATOR_SET_SIZE).set(size);
    }
}

impl CacheMetricsSink for PrometheusSink {
    fn inc_hit(&self, cache: &'static str) {
        get_metric!(CACHE_HITS_TOTAL).with_label_values(&[cache]).inc();
    }
    fn inc_miss(&self, cache: &'static str) {
        get_metric!(CACHE_MISSES_TOTAL).with_label_values(&[cache]).inc();
    }
    fn inc_invalidation(&self, cache: &'static str) {
        get_metric!(CACHE_INVALIDATIONS_TOTAL)
            .with_label_values(&[cache])
            .inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        get_metric!(ERRORS_TOTAL).with_label_values(&[kind, code]).inc();
    }
}

/// Initializes all Prometheus collectors and returns a static reference to
/// the sink. Must be called exactly once at node startup.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    STORAGE_NODES_WRITTEN_TOTAL
        .set(register_int_counter!(
            "jarnet_storage_nodes_written_total",
            "Total trie nodes written to the backing store."
        )?)
        .expect("static already initialized");
    STORAGE_BYTES_WRITTEN_TOTAL
        .set(register_int_counter!(
            "jarnet_storage_bytes_written_total",
            "Total bytes written to the backing store for new nodes."
        )?)
        .expect("static already initialized");
    STORAGE_NODES_GCED_TOTAL
        .set(register_int_counter!(
            "jarnet_storage_nodes_gced_total",
            "Total unreachable trie nodes removed by the background collector."
        )?)
        .expect("static already initialized");
    STORAGE_DISK_USAGE_BYTES
        .set(register_gauge!(
            "jarnet_storage_disk_usage_bytes",
            "Estimated total disk usage of the storage backend."
        )?)
        .expect("static already initialized");
    REQUESTS_TOTAL
        .set(register_int_counter_vec!(
            "jarnet_requests_total",
            "Total transaction requests reaching a terminal outcome.",
            &["request_kind", "outcome"]
        )?)
        .expect("static already initialized");
    GAS_CONSUMED
        .set(register_histogram!(
            "jarnet_gas_consumed",
            "Gas consumed per accepted request.",
            exponential_buckets(100.0, 2.0, 20)?
        )?)
        .expect("static already initialized");
    BUILD_DURATION_SECONDS
        .set(register_histogram_vec!(
            "jarnet_build_duration_seconds",
            "Latency of building a single transaction response.",
            &["request_kind"],
            exponential_buckets(0.0005, 2.0, 16)?
        )?)
        .expect("static already initialized");
    BLOCKS_COMMITTED_TOTAL
        .set(register_int_counter!(
            "jarnet_blocks_committed_total",
            "Total blocks committed through the ABCI bridge."
        )?)
        .expect("static already initialized");
    DELIVER_TX_DURATION_SECONDS
        .set(register_histogram!(
            "jarnet_deliver_tx_duration_seconds",
            "Latency of a single deliverTx call.",
            exponential_buckets(0.0005, 2.0, 16)?
        )?)
        .expect("static already initialized");
    VALIDATOR_SET_SIZE
        .set(register_gauge!(
            "jarnet_validator_set_size",
            "Current number of active validators."
        )?)
        .expect("static already initialized");
    CACHE_HITS_TOTAL
        .set(register_int_counter_vec!(
            "jarnet_cache_hits_total",
            "Total cache hits, labeled by cache name.",
            &["cache"]
        )?)
        .expect("static already initialized");
    CACHE_MISSES_TOTAL
        .set(register_int_counter_vec!(
            "jarnet_cache_misses_total",
            "Total cache misses, labeled by cache name.",
            &["cache"]
        )?)
        .expect("static already initialized");
    CACHE_INVALIDATIONS_TOTAL
        .set(register_int_counter_vec!(
            "jarnet_cache_invalidations_total",
            "Total cache invalidations, labeled by cache name.",
            &["cache"]
        )?)
        .expect("static already initialized");
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "jarnet_errors_total",
            "Total errors, categorized by taxonomy kind and error code.",
            &["kind", "code"]
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
