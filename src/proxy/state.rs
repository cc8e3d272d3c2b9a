//! Proxy state shared across request handlers

use crate::proxy::forward::Forwarder;

/// Shared state for the proxy server
///
/// Cloned per request by axum. Filter state is NOT held here: each response
/// stream owns its own `FilterState`, so concurrent requests never interact
/// beyond the HTTP client's connection pool.
#[derive(Clone)]
pub struct ProxyState {
    /// HTTP client for forwarding requests
    pub(super) client: reqwest::Client,
    /// Upstream base URL, e.g. "http://127.0.0.1:11434"
    pub(super) upstream_url: String,
    /// Verbatim forwarder for the catch-all route
    pub(super) forwarder: Forwarder,
}

impl ProxyState {
    pub fn new(client: reqwest::Client, upstream_url: String) -> Self {
        let forwarder = Forwarder::new(client.clone(), upstream_url.clone());
        Self {
            client,
            upstream_url,
            forwarder,
        }
    }
}
