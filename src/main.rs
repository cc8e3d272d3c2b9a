// unthink - transparent reasoning-stripping proxy for local model servers
//
// Sits between a chat client and an Ollama-compatible server, rewriting
// chat/generation responses to remove <think>...</think> spans before they
// reach the client. Everything else is forwarded verbatim.
//
// Architecture:
// - Proxy server (axum): routes chat/generate through the filter, the rest verbatim
// - Tag filter: explicit per-stream state machine over response fragments
// - Stream transformer: NDJSON line framing around the filter

mod cli;
mod config;
mod filter;
mod proxy;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = Config::resolve(&cli)?;

    // Precedence: RUST_LOG env var > --log-level flag > default "info"
    let default_filter = format!("unthink={lvl},tower_http={lvl}", lvl = config.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Graceful shutdown on ctrl-c: the server finishes in-flight streams
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    proxy::start_proxy(config, shutdown_rx).await
}
