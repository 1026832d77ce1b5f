//! HTTP implementation of the Grok backend contract.

use super::{GrokBackend, UpstreamReply};
use crate::config::UpstreamConfig;
use async_trait::async_trait;
use futures::StreamExt;
use grokrelay_types::protocol::ChatRequest;
use grokrelay_types::UpstreamError;
use serde_json::Value;
use std::time::Duration;

pub struct GrokHttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl GrokHttpClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| UpstreamError::transport(format!("build client: {}", e)))?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl GrokBackend for GrokHttpClient {
    async fn exchange(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<UpstreamReply, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("x-request-id", uuid::Uuid::new_v4().to_string())
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: truncate(&body, 300),
                retry_after_secs,
            });
        }

        if request.stream {
            let stream = response
                .bytes_stream()
                .map(|item| item.map_err(|e| UpstreamError::transport(e.to_string())));
            Ok(UpstreamReply::EventStream(Box::pin(stream)))
        } else {
            let value: Value = response
                .json()
                .await
                .map_err(|e| UpstreamError::malformed(e.to_string()))?;
            Ok(parse_completed(&value))
        }
    }
}

fn parse_completed(value: &Value) -> UpstreamReply {
    let message = value
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"));

    let text = message
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    // Locators live on the message or at the payload root.
    let media_urls = message
        .and_then(|m| m.get("media_urls"))
        .or_else(|| value.get("media_urls"))
        .and_then(|u| u.as_array())
        .map(|arr| {
            arr.iter().filter_map(|u| u.as_str()).map(|u| u.to_string()).collect()
        })
        .unwrap_or_default();

    UpstreamReply::Completed { text, media_urls }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(max_len).collect();
        result.push('…');
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{decode_stream, StreamEvent};
    use grokrelay_types::models::CallOutcome;
    use grokrelay_types::protocol::{ChatMessage, ChatRole};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> UpstreamConfig {
        UpstreamConfig { base_url, ..Default::default() }
    }

    fn chat_request(stream: bool) -> ChatRequest {
        let messages = vec![ChatMessage::text(ChatRole::User, "hello")];
        if stream {
            ChatRequest::streaming("grok-3-fast", messages)
        } else {
            ChatRequest::blocking("grok-3-fast", messages)
        }
    }

    #[tokio::test]
    async fn test_blocking_exchange_parses_text_and_media() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sso-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "done"}}],
                "media_urls": ["users/img1.png"]
            })))
            .mount(&server)
            .await;

        let client = GrokHttpClient::new(&test_config(server.uri())).expect("client");
        let reply = client.exchange("sso-test", &chat_request(false)).await.expect("exchange");

        let UpstreamReply::Completed { text, media_urls } = reply else {
            panic!("expected completed reply");
        };
        assert_eq!(text, "done");
        assert_eq!(media_urls, vec!["users/img1.png"]);
    }

    #[tokio::test]
    async fn test_streaming_exchange_yields_decodable_chunks() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\ndata: [DONE]\n\n";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let client = GrokHttpClient::new(&test_config(server.uri())).expect("client");
        let reply = client.exchange("sso-test", &chat_request(true)).await.expect("exchange");

        let UpstreamReply::EventStream(chunks) = reply else {
            panic!("expected event stream");
        };
        let events: Vec<StreamEvent> = decode_stream(chunks).collect().await;
        assert_eq!(
            events,
            vec![
                StreamEvent::ContentDelta { text: "hi".to_string() },
                StreamEvent::Terminator
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_status_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "30")
                    .set_body_string("slow down"),
            )
            .mount(&server)
            .await;

        let client = GrokHttpClient::new(&test_config(server.uri())).expect("client");
        let err = client
            .exchange("sso-test", &chat_request(false))
            .await
            .expect_err("429 must fail");

        assert_eq!(err.outcome(), CallOutcome::RateLimited { retry_after_secs: Some(30) });
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credential"))
            .mount(&server)
            .await;

        let client = GrokHttpClient::new(&test_config(server.uri())).expect("client");
        let err = client
            .exchange("sso-bad", &chat_request(false))
            .await
            .expect_err("401 must fail");

        assert_eq!(err.outcome(), CallOutcome::AuthFailed);
    }
}
