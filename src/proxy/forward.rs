//! Verbatim request forwarding for the catch-all route
//!
//! Anything that is not a chat/generation POST goes through here untouched:
//! model listings, version checks, pulls. The forwarder owns its client
//! handle and upstream base so it can be exercised without the router.

use axum::{
    body::Body,
    http::{HeaderMap, Method, Response},
};
use futures::TryStreamExt;

use super::error::ProxyError;

/// Request headers that must not be copied upstream
fn skip_request_header(name: &str) -> bool {
    matches!(name, "host" | "connection" | "transfer-encoding" | "content-length")
}

/// Response headers that must not be copied back to the client
/// (hop-by-hop, or invalidated by re-framing the body)
fn skip_response_header(name: &str) -> bool {
    matches!(
        name,
        "transfer-encoding" | "connection" | "content-length" | "content-encoding"
    )
}

/// Forwards a request to the upstream server byte-for-byte
#[derive(Clone)]
pub(crate) struct Forwarder {
    client: reqwest::Client,
    upstream_url: String,
}

impl Forwarder {
    pub(crate) fn new(client: reqwest::Client, upstream_url: String) -> Self {
        Self {
            client,
            upstream_url,
        }
    }

    /// Forward one request and stream the upstream response straight back.
    ///
    /// `path_and_query` must start with '/'.
    pub(crate) async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: bytes::Bytes,
    ) -> Result<Response<Body>, ProxyError> {
        let url = format!("{}{}", self.upstream_url, path_and_query);
        tracing::debug!("Forwarding {} {} verbatim", method, path_and_query);

        let mut upstream_req = self.client.request(method, &url).body(body);
        for (key, value) in headers.iter() {
            if skip_request_header(key.as_str()) {
                continue;
            }
            upstream_req = upstream_req.header(key.as_str(), value.as_bytes());
        }

        let upstream_resp = upstream_req
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        let mut builder = Response::builder().status(upstream_resp.status().as_u16());
        for (key, value) in upstream_resp.headers().iter() {
            if skip_response_header(key.as_str()) {
                continue;
            }
            builder = builder.header(key.as_str(), value.as_bytes());
        }

        let body_stream = upstream_resp.bytes_stream().map_err(axum::Error::new);
        builder
            .body(Body::from_stream(body_stream))
            .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
    }
}
