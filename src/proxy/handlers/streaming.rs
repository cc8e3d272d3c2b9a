//! Streaming response transformer
//!
//! The upstream emits newline-delimited JSON records. Each record is parsed,
//! its `message.content` run through the tag filter with per-stream state,
//! and re-emitted as one NDJSON line. Records the filter empties out are
//! suppressed entirely. Lines that fail to parse are forwarded raw so a
//! malformed upstream never kills the stream.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

use crate::filter::{self, FilterState};

pub(crate) type BoxedByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, axum::Error>> + Send>>;

/// Wrap an upstream byte stream in the line-framed filter pipeline.
///
/// Each output item is one complete NDJSON line. Output order equals input
/// order; suppressed records are simply absent. Dropping the returned stream
/// drops the upstream reader, releasing the connection.
pub(crate) fn filtered_ndjson_stream<S, E>(upstream: S) -> BoxedByteStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let reader = StreamReader::new(upstream.map_err(std::io::Error::other));
    let lines = FramedRead::new(reader, LinesCodec::new());

    Box::pin(async_stream::try_stream! {
        let mut state = FilterState::default();
        tokio::pin!(lines);

        while let Some(line) = lines.next().await {
            let line = line.map_err(axum::Error::new)?;
            if let Some(out) = transform_line(&line, &mut state) {
                yield Bytes::from(out);
            }
        }
    })
}

/// Transform one upstream record into at most one output line.
///
/// Returns None for blank lines and for records whose retained text is
/// empty after filtering. Pass-through cases return the raw input line so
/// untouched records stay byte-identical.
fn transform_line(line: &str, state: &mut FilterState) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let mut record: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(_) => return Some(format!("{line}\n")), // forward malformed output as-is
    };

    let Some(text) = chat_content(&record).map(str::to_string) else {
        // No text payload (done markers, generate records): pass through
        return Some(format!("{line}\n"));
    };

    let (kept, next) = filter::apply(&text, state.clone());
    *state = next;

    if kept.trim().is_empty() {
        return None; // whole fragment was thinking text
    }

    if let Some(slot) = chat_content_mut(&mut record) {
        *slot = Value::String(kept);
    }

    match serde_json::to_string(&record) {
        Ok(s) => Some(s + "\n"),
        // Never lose a record to an internal serialization bug
        Err(_) => Some(format!("{line}\n")),
    }
}

fn chat_content(record: &Value) -> Option<&str> {
    record.get("message")?.get("content")?.as_str()
}

fn chat_content_mut(record: &mut Value) -> Option<&mut Value> {
    record.get_mut("message")?.get_mut("content")
}
