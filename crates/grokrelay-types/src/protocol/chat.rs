//! Chat request types for the upstream exchange.

use serde::{Deserialize, Serialize};

/// Message role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Reference to an image by URL inside a structured content part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
}

/// One part of a structured message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

/// Message content: plain text or a structured list mixing text and
/// image-reference parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// Chat message (role + content).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: MessageContent::Text(content.into()) }
    }

    /// User message mixing a text prompt with an image reference, as used by
    /// image-to-video generation.
    pub fn user_with_image(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: prompt.into() },
                ContentPart::ImageUrl { image_url: ImageRef { url: image_url.into() } },
            ]),
        }
    }
}

/// One upstream exchange: model id, message list, and a streaming flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    /// Requested generation count (image mode); advisory for upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
}

impl ChatRequest {
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { model: model.into(), messages, stream: true, n: None }
    }

    pub fn blocking(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { model: model.into(), messages, stream: false, n: None }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_serializes_flat() {
        let msg = ChatMessage::text(ChatRole::User, "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn test_mixed_parts_serialize_tagged() {
        let msg = ChatMessage::user_with_image("animate this", "https://example.com/a.png");
        let json = serde_json::to_value(&msg).unwrap();
        let parts = json["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "https://example.com/a.png");
    }

    #[test]
    fn test_request_omits_absent_count() {
        let req = ChatRequest::streaming("grok-3-fast", vec![]);
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"n\""));
        assert!(json.contains("\"stream\":true"));
    }
}
