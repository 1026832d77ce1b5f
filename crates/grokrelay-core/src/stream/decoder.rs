//! Line-oriented decoder state machine.

use super::StreamEvent;
use serde_json::Value;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Decoder state. Once Terminated, no further line produces an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitingLine,
    Terminated,
}

/// Pure step function: `(state, raw line) -> (new state, optional event)`.
///
/// - Lines without the `data: ` prefix are ignored.
/// - The `[DONE]` payload terminates the stream.
/// - A JSON payload yields a content delta or media reference when present.
/// - A payload that fails to parse yields `Malformed`; decoding continues.
pub fn decode_line(state: DecodeState, raw: &str) -> (DecodeState, Option<StreamEvent>) {
    if state == DecodeState::Terminated {
        return (DecodeState::Terminated, None);
    }

    let line = raw.trim();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return (DecodeState::AwaitingLine, None);
    };

    let payload = payload.trim();
    if payload == DONE_MARKER {
        return (DecodeState::Terminated, Some(StreamEvent::Terminator));
    }

    let Ok(value) = serde_json::from_str::<Value>(payload) else {
        return (DecodeState::AwaitingLine, Some(StreamEvent::Malformed));
    };

    if let Some(urls) = extract_media_urls(&value) {
        return (DecodeState::AwaitingLine, Some(StreamEvent::MediaReference { urls }));
    }

    if let Some(text) = extract_content_delta(&value) {
        return (
            DecodeState::AwaitingLine,
            Some(StreamEvent::ContentDelta { text: text.to_string() }),
        );
    }

    // Valid JSON without a delta (keep-alives, role announcements).
    (DecodeState::AwaitingLine, None)
}

fn extract_content_delta(value: &Value) -> Option<&str> {
    value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|t| t.as_str())
}

/// Media locators appear either on the first delta or at the payload root.
fn extract_media_urls(value: &Value) -> Option<Vec<String>> {
    let from_delta = value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("media_urls"));

    let raw = from_delta.or_else(|| value.get("media_urls"))?.as_array()?;

    let urls: Vec<String> =
        raw.iter().filter_map(|u| u.as_str()).map(|u| u.to_string()).collect();
    if urls.is_empty() {
        None
    } else {
        Some(urls)
    }
}
