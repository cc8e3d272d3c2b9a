//! Request and response handlers for the proxy
//!
//! This module contains the inference handler for the filtered routes and
//! the streaming/buffered response transformers it dispatches to.

mod buffered;
mod request;
mod streaming;

pub(crate) use request::inference_handler;
