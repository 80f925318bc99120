// Path: crates/telemetry/src/lib.rs
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

//! Observability infrastructure for the jarnet transaction engine: structured
//! logging initialization, a Prometheus-backed metrics sink, and abstract
//! sink traits that decouple instrumentation call sites from the backend.

/// A minimal `/metrics`, `/healthz`, `/readyz` HTTP server exposing the
/// Prometheus registry `prometheus_sink::install` populates.
pub mod http;
/// The initialization routine for global structured logging.
pub mod init;
/// The concrete implementation of metrics sinks using the `prometheus` crate.
pub mod prometheus_sink;
/// Abstract traits (`*MetricsSink`) that define the contract for metrics reporting.
pub mod sinks;
/// A simple RAII timer for measuring the duration of a scope.
pub mod time;

pub use sinks::{error_metrics, service_metrics};
