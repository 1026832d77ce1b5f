//! Upstream backend contract.
//!
//! The core needs exactly one exchange shape from the backend: a chat
//! request in, either a raw event stream or a completed result with media
//! locators out. Everything else about the transport stays behind the
//! `GrokBackend` seam.

mod grok;

pub use grok::GrokHttpClient;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use grokrelay_types::protocol::ChatRequest;
use grokrelay_types::UpstreamError;
use std::pin::Pin;

/// Raw chunk stream from a streaming exchange.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// What the backend hands back for one exchange.
pub enum UpstreamReply {
    /// Streaming: an ordered, finite sequence of raw byte chunks.
    EventStream(ChunkStream),
    /// Non-streaming: the generated text plus any media locators.
    Completed { text: String, media_urls: Vec<String> },
}

impl std::fmt::Debug for UpstreamReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamReply::EventStream(_) => f.debug_tuple("EventStream").finish(),
            UpstreamReply::Completed { text, media_urls } => f
                .debug_struct("Completed")
                .field("text", text)
                .field("media_urls", media_urls)
                .finish(),
        }
    }
}

/// One request/response exchange with the Grok backend.
#[async_trait]
pub trait GrokBackend: Send + Sync {
    async fn exchange(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<UpstreamReply, UpstreamError>;
}
