// Proxy module - HTTP server that forwards requests to a local Ollama server
//
// This module implements a transparent HTTP proxy using Axum. Chat and
// generation responses pass through the thinking-tag filter on the way back
// to the client; every other request is forwarded verbatim.

pub mod error;
pub mod forward;
pub mod handlers;
pub mod server;
pub mod state;

pub use server::start_proxy;
