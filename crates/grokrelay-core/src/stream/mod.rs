//! Upstream event-stream decoding.
//!
//! `decoder` holds the pure line-oriented state machine; `reader` feeds it
//! from a chunked byte stream, tolerating lines split across chunk
//! boundaries.

mod decoder;
mod reader;

pub use decoder::{decode_line, DecodeState};
pub use reader::decode_stream;

/// One decoded event from the upstream stream.
///
/// Constructed per parsed line, consumed immediately by the response
/// adapter, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of generated text.
    ContentDelta { text: String },
    /// One or more media locators (backend-relative or absolute).
    MediaReference { urls: Vec<String> },
    /// Explicit end-of-stream marker; nothing follows.
    Terminator,
    /// A line that failed to parse; skipped, never fatal.
    Malformed,
}
