// Path: crates/node/src/bin/jarnet-node.rs
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

use anyhow::{Context, Result};
use clap::Parser;
use jarnet_node::Node;
use jarnet_types::config::NodeConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "jarnet-node", about = "The jarnet transaction execution engine node")]
struct Opts {
    /// Path to the node's TOML configuration file.
    #[arg(long, env = "JARNET_CONFIG")]
    config: PathBuf,

    /// How often to attempt producing a block from the queued requests.
    #[arg(long, default_value = "1000")]
    block_period_millis: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    jarnet_telemetry::init::init_tracing()?;
    let sink = jarnet_telemetry::prometheus_sink::install().context("installing prometheus metrics sink")?;
    let _ = jarnet_telemetry::sinks::SINK.set(sink);

    let opts = Opts::parse();
    let raw = std::fs::read_to_string(&opts.config).with_context(|| format!("reading {}", opts.config.display()))?;
    let config = NodeConfig::from_toml_str(&raw).with_context(|| format!("parsing {}", opts.config.display()))?;
    tracing::info!(target: "node", chain_id = %config.chain_id, dir = %config.dir, "starting");

    let metrics_addr_str = std::env::var("JARNET_METRICS_ADDR").unwrap_or_else(|_| "127.0.0.1:9617".to_string());
    let metrics_addr = metrics_addr_str.parse().with_context(|| format!("invalid metrics address {metrics_addr_str}"))?;
    tokio::spawn(jarnet_telemetry::http::run_server(metrics_addr));

    let ctx = jarnet_node::build_context(config)?;
    jarnet_telemetry::http::mark_ready();
    let node = Node::new(ctx);

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    node.run_forever(Duration::from_millis(opts.block_period_millis), shutdown).await;

    tracing::info!(target: "node", "stopped");
    Ok(())
}
