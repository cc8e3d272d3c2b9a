//! Inference request handler for /api/chat and /api/generate
//!
//! Reads the client's request, forwards it upstream, and routes the response
//! through either the streaming transformer or the buffered cleanup
//! depending on the request's `stream` flag.

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
};
use serde::Deserialize;

use crate::proxy::error::ProxyError;
use crate::proxy::state::ProxyState;

use super::{buffered, streaming};

/// The slice of the request body the proxy itself inspects
#[derive(Debug, Deserialize)]
struct InferenceRequest {
    stream: Option<bool>,
}

/// Headers that must not be copied upstream
fn skip_request_header(name: &str) -> bool {
    matches!(name, "host" | "connection" | "transfer-encoding" | "content-length")
}

/// Handle a chat or generation request
pub(crate) async fn inference_handler(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let path = req.uri().path().to_string();
    let headers = req.headers().clone();

    let body_bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    // Ollama streams unless the client says otherwise
    let is_streaming = serde_json::from_slice::<InferenceRequest>(&body_bytes)
        .ok()
        .and_then(|r| r.stream)
        .unwrap_or(true);

    tracing::debug!("Proxying POST {} (stream: {})", path, is_streaming);

    let url = format!("{}{}", state.upstream_url, path);
    let mut upstream_req = state.client.post(&url).body(body_bytes.to_vec());
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

    let status = upstream_resp.status();
    if !status.is_success() {
        // Propagate upstream errors with their body untouched
        let body = upstream_resp
            .bytes()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        return Response::builder()
            .status(status.as_u16())
            .body(Body::from(body))
            .map_err(|e| ProxyError::ResponseBuild(e.to_string()));
    }

    if is_streaming {
        let stream = streaming::filtered_ndjson_stream(upstream_resp.bytes_stream());
        Response::builder()
            .status(status.as_u16())
            .header("content-type", "application/x-ndjson")
            // Keep intermediaries from buffering or caching the stream
            .header("cache-control", "no-cache")
            .header("x-accel-buffering", "no")
            .body(Body::from_stream(stream))
            .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
    } else {
        let body = upstream_resp
            .bytes()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        Response::builder()
            .status(status.as_u16())
            .header("content-type", "application/json")
            .body(Body::from(buffered::clean_response(&body)))
            .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_flag(body: &[u8]) -> bool {
        serde_json::from_slice::<InferenceRequest>(body)
            .ok()
            .and_then(|r| r.stream)
            .unwrap_or(true)
    }

    #[test]
    fn stream_flag_defaults_to_true() {
        assert!(stream_flag(br#"{"model": "m", "messages": []}"#));
        assert!(stream_flag(b"not json"));
    }

    #[test]
    fn stream_flag_respects_explicit_value() {
        assert!(!stream_flag(br#"{"model": "m", "stream": false}"#));
        assert!(stream_flag(br#"{"model": "m", "stream": true}"#));
    }
}
