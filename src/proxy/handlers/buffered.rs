//! Buffered (non-streaming) response cleanup
//!
//! With the complete body in hand there is no partial-marker state to track;
//! the text payload just gets the one-shot `strip_thinking` cleanup.

use bytes::Bytes;
use serde_json::Value;

use crate::filter;

/// Strip thinking spans from a complete response body.
///
/// Works on both record shapes: `message.content` (chat) and `response`
/// (generate). Any failure, including an unrecognized shape, returns the
/// original bytes unchanged.
pub(super) fn clean_response(body: &Bytes) -> Bytes {
    let Ok(mut record) = serde_json::from_slice::<Value>(body) else {
        return body.clone();
    };
    let Some(slot) = content_slot(&mut record) else {
        return body.clone();
    };
    let Some(text) = slot.as_str() else {
        return body.clone();
    };

    let cleaned = filter::strip_thinking(text);
    *slot = Value::String(cleaned);

    match serde_json::to_vec(&record) {
        Ok(bytes) => Bytes::from(bytes),
        Err(_) => body.clone(),
    }
}

/// The text payload slot: `message.content` (chat) or `response` (generate)
fn content_slot(record: &mut Value) -> Option<&mut Value> {
    if record
        .get("message")
        .and_then(|m| m.get("content"))
        .is_some()
    {
        return record.get_mut("message").and_then(|m| m.get_mut("content"));
    }
    record.get_mut("response")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(s: &str) -> Value {
        let out = clean_response(&Bytes::copy_from_slice(s.as_bytes()));
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn cleans_chat_shape() {
        let v = clean(r#"{"message": {"role": "assistant", "content": "<think>x</think>hi"}, "done": true}"#);
        assert_eq!(v["message"]["content"], "hi");
        assert_eq!(v["done"], true);
    }

    #[test]
    fn cleans_generate_shape() {
        let v = clean(r#"{"response": "<think>x</think>hi", "done": true}"#);
        assert_eq!(v["response"], "hi");
    }

    #[test]
    fn unrecognized_shape_is_untouched() {
        let body = Bytes::from_static(br#"{"models": ["a", "b"]}"#);
        assert_eq!(clean_response(&body), body);
    }

    #[test]
    fn invalid_json_is_untouched() {
        let body = Bytes::from_static(b"not json at all");
        assert_eq!(clean_response(&body), body);
    }

    #[test]
    fn non_string_payload_is_untouched() {
        let body = Bytes::from_static(br#"{"response": 42}"#);
        assert_eq!(clean_response(&body), body);
    }

    #[test]
    fn cleanup_is_idempotent_end_to_end() {
        let body =
            Bytes::from_static(br#"{"response": "a<think>x</think>\n\n\nb", "done": true}"#);
        let once = clean_response(&body);
        let twice = clean_response(&once);
        assert_eq!(once, twice);
    }
}
