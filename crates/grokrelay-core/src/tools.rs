//! Tool operations: converse, generate-image, generate-video, list-models.
//!
//! Each operation acquires a token, runs one upstream exchange, folds the
//! reply into its output shape, and reports the outcome back to the pool.
//! Failures surface as `RelayError` so callers handle "no token" and
//! "invocation failed" distinctly.

use crate::adapter::{self, InvocationResult, TextFold};
use crate::pool::TokenPool;
use crate::stream::decode_stream;
use crate::upstream::{GrokBackend, UpstreamReply};
use grokrelay_types::models::{grok_catalog, ModelInfo};
use grokrelay_types::protocol::{ChatMessage, ChatRequest, ChatRole};
use grokrelay_types::{CallOutcome, InvocationError, RelayError};
use std::sync::Arc;

const DEFAULT_CHAT_MODEL: &str = "grok-3-fast";
const DEFAULT_VIDEO_MODEL: &str = "grok-imagine-0.9";
const DEFAULT_IMAGE_COUNT: u32 = 2;

pub struct ToolService {
    pool: Arc<TokenPool>,
    backend: Arc<dyn GrokBackend>,
    asset_host: String,
}

impl ToolService {
    pub fn new(
        pool: Arc<TokenPool>,
        backend: Arc<dyn GrokBackend>,
        asset_host: impl Into<String>,
    ) -> Self {
        Self { pool, backend, asset_host: asset_host.into() }
    }

    /// Streaming chat folded into plain text.
    pub async fn converse(
        &self,
        query: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<InvocationResult, RelayError> {
        let model = model.unwrap_or(DEFAULT_CHAT_MODEL);

        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(ChatMessage::text(ChatRole::System, system));
        }
        messages.push(ChatMessage::text(ChatRole::User, query));
        let request = ChatRequest::streaming(model, messages);

        let token = self.pool.acquire()?;
        tracing::info!("converse: model={}", model);

        let reply = match self.backend.exchange(&token.value, &request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.pool.report_outcome(&token.value, e.outcome());
                return Err(
                    InvocationError::generation(format!("conversation failed: {}", e)).into()
                );
            },
        };

        let fold = match reply {
            UpstreamReply::EventStream(chunks) => adapter::fold_text(decode_stream(chunks)).await,
            // Some models answer in one shot even when streaming was asked for.
            UpstreamReply::Completed { text, .. } => TextFold { text, terminated: true },
        };

        // A stream that died before its terminator is a partial result;
        // the token is not punished for it.
        let outcome = if fold.terminated { CallOutcome::Success } else { CallOutcome::Neutral };
        self.pool.report_outcome(&token.value, outcome);

        Ok(InvocationResult::Text(fold.text))
    }

    /// Non-streaming generation rendered as a Markdown image block.
    pub async fn generate_image(
        &self,
        prompt: &str,
        count: Option<u32>,
        model: Option<&str>,
    ) -> Result<InvocationResult, RelayError> {
        let model = model.unwrap_or(DEFAULT_CHAT_MODEL);

        let messages = vec![ChatMessage::text(
            ChatRole::User,
            format!("Generate an image for the following description: {}", prompt),
        )];
        let mut request = ChatRequest::blocking(model, messages);
        request.n = Some(count.unwrap_or(DEFAULT_IMAGE_COUNT));

        let token = self.pool.acquire()?;
        tracing::info!("generate_image: model={}", model);

        let media_urls = self
            .completed_media(&token.value, &request, "image generation failed")
            .await?;

        Ok(adapter::render_image_markdown(&media_urls, &self.asset_host)?)
    }

    /// Image-to-video generation rendered as an embeddable tag.
    pub async fn generate_video(
        &self,
        image_url: &str,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<InvocationResult, RelayError> {
        let model = model.unwrap_or(DEFAULT_VIDEO_MODEL);

        let messages = vec![ChatMessage::user_with_image(prompt, image_url)];
        let request = ChatRequest::blocking(model, messages);

        let token = self.pool.acquire()?;
        tracing::info!("generate_video: model={}", model);

        let media_urls = self
            .completed_media(&token.value, &request, "video generation failed")
            .await?;

        Ok(adapter::render_video_tag(&media_urls, &self.asset_host)?)
    }

    /// Structured catalog of known models.
    pub fn list_models(&self) -> Vec<ModelInfo> {
        grok_catalog()
    }

    /// Run a non-streaming exchange and return its media locators.
    async fn completed_media(
        &self,
        token: &str,
        request: &ChatRequest,
        failure_prefix: &str,
    ) -> Result<Vec<String>, RelayError> {
        match self.backend.exchange(token, request).await {
            Ok(UpstreamReply::Completed { media_urls, .. }) => {
                self.pool.report_outcome(token, CallOutcome::Success);
                Ok(media_urls)
            },
            Ok(UpstreamReply::EventStream(_)) => {
                self.pool.report_outcome(token, CallOutcome::Success);
                Err(InvocationError::decode(format!(
                    "{}: upstream streamed where a completed result was expected",
                    failure_prefix
                ))
                .into())
            },
            Err(e) => {
                self.pool.report_outcome(token, e.outcome());
                Err(InvocationError::generation(format!("{}: {}", failure_prefix, e)).into())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use grokrelay_types::{PoolError, TokenStatus, UpstreamError};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend double with a queue of canned replies.
    #[derive(Default)]
    struct MockBackend {
        replies: Mutex<VecDeque<Result<UpstreamReply, UpstreamError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl MockBackend {
        fn push(&self, reply: Result<UpstreamReply, UpstreamError>) {
            self.replies.lock().expect("lock").push_back(reply);
        }

        fn recorded(&self) -> Vec<ChatRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl GrokBackend for MockBackend {
        async fn exchange(
            &self,
            _token: &str,
            request: &ChatRequest,
        ) -> Result<UpstreamReply, UpstreamError> {
            self.requests.lock().expect("lock").push(request.clone());
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .expect("mock backend got an unplanned exchange")
        }
    }

    fn event_stream(lines: &[&str]) -> UpstreamReply {
        let chunks: Vec<Result<Bytes, UpstreamError>> =
            lines.iter().map(|l| Ok(Bytes::from(format!("{}\n", l)))).collect();
        UpstreamReply::EventStream(Box::pin(stream::iter(chunks)))
    }

    fn service_with(backend: Arc<MockBackend>) -> (ToolService, Arc<TokenPool>) {
        let pool = Arc::new(TokenPool::new(
            Arc::new(MemoryStore::new()),
            PoolConfig::default(),
        ));
        pool.insert("sso-alpha-0001").expect("insert");
        pool.refresh_statuses();

        let service = ToolService::new(pool.clone(), backend, "https://assets.grok.com/");
        (service, pool)
    }

    #[tokio::test]
    async fn test_converse_folds_stream_to_text() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(event_stream(&[
            r#"data: {"choices":[{"delta":{"content":"hi "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"there"}}]}"#,
            "data: [DONE]",
        ])));

        let (service, pool) = service_with(backend.clone());
        let result = service.converse("hello", None, None).await.expect("converse");

        assert_eq!(result, InvocationResult::Text("hi there".to_string()));
        assert_eq!(pool.snapshot()[0].status, TokenStatus::Valid);

        let requests = backend.recorded();
        assert!(requests[0].stream);
        assert_eq!(requests[0].model, "grok-3-fast");
    }

    #[tokio::test]
    async fn test_converse_includes_system_prompt() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(event_stream(&["data: [DONE]"])));

        let (service, _pool) = service_with(backend.clone());
        let result = service
            .converse("hello", Some("grok-4"), Some("be terse"))
            .await
            .expect("converse");

        assert_eq!(result, InvocationResult::Text(String::new()));

        let request = &backend.recorded()[0];
        assert_eq!(request.model, "grok-4");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
    }

    #[tokio::test]
    async fn test_converse_rate_limit_cools_token_down() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Err(UpstreamError::Status {
            status: 429,
            message: "slow down".to_string(),
            retry_after_secs: Some(600),
        }));

        let (service, pool) = service_with(backend);
        let err = service.converse("hello", None, None).await.expect_err("must fail");
        assert!(matches!(err, RelayError::Invocation(_)));
        assert_eq!(pool.snapshot()[0].status, TokenStatus::RateLimited);

        // The only token is cooling down: the next call reports no-token,
        // a distinct, retryable condition.
        let err = service.converse("hello", None, None).await.expect_err("pool empty");
        assert!(matches!(err, RelayError::Pool(PoolError::NoTokenAvailable)));
    }

    #[tokio::test]
    async fn test_converse_partial_stream_is_neutral() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(event_stream(&[
            r#"data: {"choices":[{"delta":{"content":"cut"}}]}"#,
            // no [DONE]: upstream connection died
        ])));

        let (service, pool) = service_with(backend);
        let result = service.converse("hello", None, None).await.expect("partial fold");

        assert_eq!(result, InvocationResult::Text("cut".to_string()));
        assert_eq!(pool.snapshot()[0].status, TokenStatus::Valid, "no punishment");
    }

    #[tokio::test]
    async fn test_generate_image_renders_markdown() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(UpstreamReply::Completed {
            text: String::new(),
            media_urls: vec!["users/img1.png".to_string()],
        }));

        let (service, _pool) = service_with(backend.clone());
        let result = service.generate_image("a cat in space", None, None).await.expect("image");

        assert_eq!(
            result,
            InvocationResult::ImageMarkdown(
                "![Generated Image 1](https://assets.grok.com/users/img1.png)".to_string()
            )
        );

        let request = &backend.recorded()[0];
        assert!(!request.stream);
        assert_eq!(request.n, Some(2));
    }

    #[tokio::test]
    async fn test_generate_image_empty_media_fails_with_prefix() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(UpstreamReply::Completed { text: String::new(), media_urls: vec![] }));

        let (service, pool) = service_with(backend);
        let err = service.generate_image("a cat", None, None).await.expect_err("no media");

        let RelayError::Invocation(invocation) = err else {
            panic!("wrong error domain");
        };
        assert!(invocation.message.starts_with("image generation failed"));
        // Transport succeeded, so the token keeps its health.
        assert_eq!(pool.snapshot()[0].status, TokenStatus::Valid);
    }

    #[tokio::test]
    async fn test_generate_video_wraps_single_locator() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(UpstreamReply::Completed {
            text: String::new(),
            media_urls: vec!["videos/out.mp4".to_string()],
        }));

        let (service, _pool) = service_with(backend.clone());
        let result = service
            .generate_video("https://example.com/src.png", "make it move", None)
            .await
            .expect("video");

        let InvocationResult::VideoTag(tag) = result else {
            panic!("wrong shape");
        };
        assert!(tag.contains(r#"src="https://assets.grok.com/videos/out.mp4""#));

        let request = &backend.recorded()[0];
        assert_eq!(request.model, "grok-imagine-0.9");
    }

    #[tokio::test]
    async fn test_generate_video_requires_media() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Ok(UpstreamReply::Completed { text: String::new(), media_urls: vec![] }));

        let (service, _pool) = service_with(backend);
        let err = service
            .generate_video("https://example.com/src.png", "move", None)
            .await
            .expect_err("no media");
        assert!(err.to_string().contains("video generation failed"));
    }

    #[tokio::test]
    async fn test_auth_failure_exhausts_token() {
        let backend = Arc::new(MockBackend::default());
        backend.push(Err(UpstreamError::Status {
            status: 401,
            message: "invalid credential".to_string(),
            retry_after_secs: None,
        }));

        let (service, pool) = service_with(backend);
        service.generate_image("a cat", None, None).await.expect_err("auth failure");
        assert_eq!(pool.snapshot()[0].status, TokenStatus::Exhausted);
    }

    #[tokio::test]
    async fn test_list_models_exposes_capabilities() {
        let backend = Arc::new(MockBackend::default());
        let (service, _pool) = service_with(backend);

        let models = service.list_models();
        assert!(models.iter().any(|m| m.capabilities.video_generation));
        assert!(models.iter().any(|m| m.id == "grok-3-fast"));
    }
}
