//! Main entry point for the operation relay.
//!
//! This binary serves the websocket relay that forwards serialized
//! operations between replicas, using the Axum web framework.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crdt_seq::server::{DEFAULT_BUFFER, Relay, serve};

#[derive(Parser, Debug)]
#[command(name = "crdt-seq-relay")]
#[command(author, version, about = "Relays replicated sequence operations between peers", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RELAY_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Frames a slow client may fall behind before it starts losing them
    #[arg(long, env = "RELAY_BUFFER", default_value_t = DEFAULT_BUFFER)]
    buffer: usize,

    /// Log filter (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, env = "RELAY_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting replicated sequence relay...");

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;

    serve(listener, Relay::new(args.buffer))
        .await
        .context("relay server failed")
}
