//! Proxy server setup and initialization

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, Response},
    routing::{any, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;

use super::error::ProxyError;
use super::handlers::inference_handler;
use super::state::ProxyState;

/// Start the proxy server
pub async fn start_proxy(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = config.bind_addr;

    // Build the HTTP client with timeout and connection pooling
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300)) // model responses can be slow
        .pool_max_idle_per_host(10)
        // Force HTTP/1.1: the upstream speaks it, and it avoids h2 reset issues
        .http1_only()
        .build()
        .context("Failed to create HTTP client")?;

    let state = ProxyState::new(client, config.upstream_url.clone());

    // Open CORS, matching what local web UIs expect from an Ollama endpoint
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Chat and generation go through the filter; everything else is verbatim
    let app = Router::new()
        .route("/api/chat", post(inference_handler))
        .route("/api/generate", post(inference_handler))
        .route("/", any(forward_handler))
        .route("/*path", any(forward_handler))
        .layer(cors)
        .with_state(state);

    tracing::info!("Starting proxy on {}", bind_addr);
    tracing::info!("Forwarding requests to {}", config.upstream_url);

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Proxy listening on {}", bind_addr);

    // Serve with graceful shutdown: stop accepting on signal, finish
    // in-flight streams
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Proxy server shut down gracefully");
    Ok(())
}

/// Catch-all: forward anything that is not a filtered inference route
async fn forward_handler(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let method = req.method().clone();
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let headers = req.headers().clone();

    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    state
        .forwarder
        .forward(method, &path_and_query, &headers, body)
        .await
}
