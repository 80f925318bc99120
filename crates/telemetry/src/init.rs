// Path: crates/telemetry/src/init.rs
//! Global `tracing` subscriber setup for the node binary and its workers.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initializes the global `tracing` subscriber for structured JSON logging.
/// Reads `JARNET_LOG` first (consistent with this crate's `JARNET_*` env
/// convention — see `jarnet-node`'s `JARNET_CONFIG`/`JARNET_METRICS_ADDR`),
/// falling back to the ambient `RUST_LOG` and then `"info"`.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let filter = std::env::var("JARNET_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
