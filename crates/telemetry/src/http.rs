// Path: crates/telemetry/src/http.rs
//! The engine's scrape/probe surface: `/metrics` for Prometheus, `/healthz`
//! for liveness, `/readyz` for readiness. Spawned by `jarnet-node`'s binary
//! alongside the tonic-facing ABCI bridge, the same way the teacher's own
//! binaries run a telemetry server next to their gRPC service.

use axum::{
    body::Bytes,
    error_handling::HandleErrorLayer,
    http::{header::CONTENT_TYPE, HeaderName, StatusCode},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::signal;
use tower::{BoxError, ServiceBuilder};
use tower_http::trace::TraceLayer;

/// Flips once the node has installed its first store head (spec.md §4.9:
/// the genesis commit). `/readyz` reports not-ready until then, so a load
/// balancer doesn't route `deliverTx`/`checkTx` traffic at a node that has
/// no committed state to check requests against yet.
static ENGINE_READY: AtomicBool = AtomicBool::new(false);

/// Called once by `jarnet-node` after its first successful commit.
pub fn mark_ready() {
    ENGINE_READY.store(true, Ordering::SeqCst);
}

async fn metrics_handler() -> ([(HeaderName, String); 1], Bytes) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(1 << 20);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
    }
    ([(CONTENT_TYPE, encoder.format_type().to_string())], buf.into())
}

async fn healthz_handler() -> &'static str {
    "jarnet: alive"
}

async fn readyz_handler() -> (StatusCode, &'static str) {
    if ENGINE_READY.load(Ordering::SeqCst) {
        (StatusCode::OK, "jarnet: ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "jarnet: awaiting first commit")
    }
}

async fn handle_service_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "telemetry request timed out".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("unhandled telemetry server error: {err}"))
    }
}

/// Serves `/metrics`, `/healthz`, `/readyz` on `addr` until the process
/// receives Ctrl-C.
pub async fn run_server(addr: SocketAddr) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_service_error))
                .layer(TraceLayer::new_for_http())
                .load_shed()
                .concurrency_limit(8)
                .timeout(Duration::from_secs(2)),
        );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target = "jarnet_telemetry", error = %e, "failed to bind telemetry http server");
            return;
        }
    };
    match listener.local_addr() {
        Ok(bound) => tracing::info!(target = "jarnet_telemetry", addr = %bound, "telemetry server listening"),
        Err(e) => tracing::warn!(target = "jarnet_telemetry", error = %e, "telemetry server listening, local addr unknown"),
    }

    let graceful = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(target = "jarnet_telemetry", error = %e, "failed to install ctrl-c handler");
        }
        tracing::info!(target = "jarnet_telemetry", "telemetry server shutting down");
    });

    if let Err(e) = graceful.await {
        tracing::error!(target = "jarnet_telemetry", error = %e, "telemetry server error");
    }
}
