//! Chat protocol message types (OpenAI-shaped).

mod chat;

pub use chat::{ChatMessage, ChatRequest, ChatRole, ContentPart, ImageRef, MessageContent};
