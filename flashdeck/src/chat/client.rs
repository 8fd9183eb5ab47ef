use std::sync::Arc;
use std::time::Duration;

use bon::bon;
use tracing::{debug, instrument, warn};

use super::error::ChatError;
use super::retry::{backoff_delay, is_retryable_status};
use super::transport::{ChatTransport, ReqwestTransport, TransportError, TransportRequest, TransportResponse};
use super::types::{ChatCompletion, ChatCompletionRequest};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_MIN_RETRY_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Chat completion client with per-attempt timeouts and jittered exponential backoff.
///
/// ```ignore
/// let client = ChatCompletionClient::builder()
///     .api_key(key)
///     .max_retries(3)
///     .build()?;
/// let completion = client.create_chat_completion(&request).await?;
/// ```
pub struct ChatCompletionClient {
    api_key: String,
    base_url: String,
    max_retries: u32,
    min_retry_delay: Duration,
    timeout: Duration,
    site_url: Option<String>,
    app_name: Option<String>,
    transport: Arc<dyn ChatTransport>,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("min_retry_delay", &self.min_retry_delay)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[bon]
impl ChatCompletionClient {
    /// Fails with a [`ChatErrorKind::Config`](super::ChatErrorKind::Config) error when the
    /// credential is empty or the default transport cannot be built.
    #[builder]
    pub fn new(
        #[builder(into)] api_key: String,
        #[builder(into, default = DEFAULT_BASE_URL.to_string())] base_url: String,
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = DEFAULT_MIN_RETRY_DELAY)] min_retry_delay: Duration,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
        #[builder(into)] site_url: Option<String>,
        #[builder(into)] app_name: Option<String>,
        transport: Option<Arc<dyn ChatTransport>>,
    ) -> Result<Self, ChatError> {
        if api_key.trim().is_empty() {
            return Err(ChatError::config("OpenRouter API key is missing."));
        }

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::new().map_err(|e| ChatError::config(format!("Failed to build HTTP client: {e}")))?,
            ),
        };

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            min_retry_delay,
            timeout,
            site_url,
            app_name,
            transport,
        })
    }
}

impl ChatCompletionClient {
    /// Issue one logical chat completion, retrying transient failures.
    #[instrument(skip_all, fields(model = %request.model, messages = request.messages.len()), err)]
    pub async fn create_chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, ChatError> {
        if request.messages.is_empty() {
            return Err(ChatError::config("At least one message is required."));
        }

        let body = serde_json::to_vec(request).map_err(|e| ChatError::config(format!("Failed to encode request: {e}")))?;
        let outbound = TransportRequest {
            url: format!("{}/chat/completions", self.base_url),
            headers: self.headers(),
            body,
        };

        let response = self.send_with_retry(&outbound).await?;
        if !response.is_success() {
            return Err(ChatError::from_response(response.status, &response.body));
        }

        serde_json::from_str::<ChatCompletion>(&response.body).map_err(|e| {
            warn!(status = response.status, "Failed to decode chat completion: {e}");
            ChatError::unreadable_body(&response.body)
        })
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Authorization".to_string(), format!("Bearer {}", self.api_key)),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        if let Some(site_url) = &self.site_url {
            headers.push(("HTTP-Referer".to_string(), site_url.clone()));
        }
        if let Some(app_name) = &self.app_name {
            headers.push(("X-Title".to_string(), app_name.clone()));
        }
        headers
    }

    /// Run the attempt loop. Retryable statuses and transport failures back off while attempts
    /// remain; any other response is returned as-is for the caller to inspect.
    async fn send_with_retry(&self, request: &TransportRequest) -> Result<TransportResponse, ChatError> {
        let mut attempt: u32 = 0;
        let mut last_error: Option<ChatError> = None;

        while attempt <= self.max_retries {
            let error = match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
                Ok(Ok(response)) => {
                    if is_retryable_status(response.status) && attempt < self.max_retries {
                        let delay = backoff_delay(self.min_retry_delay, attempt);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.max_retries.saturating_add(1),
                            status = response.status,
                            delay_ms = delay.as_millis() as u64,
                            "Retryable status from chat provider, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    debug!(attempt = attempt + 1, status = response.status, "Chat provider responded");
                    return Ok(response);
                }
                Ok(Err(e)) => ChatError::from(e),
                Err(_) => ChatError::from(TransportError::Timeout(self.timeout)),
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            let delay = backoff_delay(self.min_retry_delay, attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts = self.max_retries.saturating_add(1),
                error = error.details.as_deref().unwrap_or(&error.message),
                delay_ms = delay.as_millis() as u64,
                "Chat provider request failed, retrying"
            );
            last_error = Some(error);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }

        Err(last_error.unwrap_or_else(|| ChatError::transport("Failed to contact OpenRouter.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatErrorKind, ChatMessage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Transport that replays a fixed script of outcomes and counts calls
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, _request: &TransportRequest) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
        }
    }

    fn status(status: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status,
            body: String::new(),
        })
    }

    fn ok_body() -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            status: 200,
            body: completion_json().to_string(),
        })
    }

    fn completion_json() -> serde_json::Value {
        json!({
            "id": "gen-123",
            "model": "openai/gpt-4o-mini",
            "created": 1_700_000_000,
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}
            ]
        })
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "openai/gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::user("Hi")],
            temperature: Some(0.3),
            max_tokens: None,
            top_p: None,
        }
    }

    fn scripted_client(transport: Arc<ScriptedTransport>, max_retries: u32) -> ChatCompletionClient {
        ChatCompletionClient::builder()
            .api_key("sk-test")
            .max_retries(max_retries)
            .min_retry_delay(Duration::from_millis(1))
            .transport(transport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = ChatCompletionClient::builder().api_key("  ").build().unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::Config);
        assert_eq!(err.message, "OpenRouter API key is missing.");
    }

    #[tokio::test]
    async fn test_empty_messages_fail_without_network() {
        let transport = ScriptedTransport::new(vec![ok_body()]);
        let client = scripted_client(transport.clone(), 2);

        let err = client
            .create_chat_completion(&ChatCompletionRequest {
                messages: vec![],
                ..request()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ChatErrorKind::Config);
        assert_eq!(err.message, "At least one message is required.");
        assert_eq!(transport.calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_every_retryable_status_gets_another_attempt() {
        for retryable in [429u16, 500, 502, 503, 504, 599] {
            let transport = ScriptedTransport::new(vec![status(retryable), ok_body()]);
            let client = scripted_client(transport.clone(), 2);

            let completion = client.create_chat_completion(&request()).await.unwrap();
            assert_eq!(completion.id, "gen-123");
            assert_eq!(transport.calls(), 2, "status {retryable} should be retried");
        }
    }

    #[tokio::test]
    async fn test_non_retryable_status_returns_first_response() {
        for terminal in [400u16, 401, 403, 404, 422] {
            let transport = ScriptedTransport::new(vec![status(terminal), ok_body()]);
            let client = scripted_client(transport.clone(), 2);

            let err = client.create_chat_completion(&request()).await.unwrap_err();
            assert_eq!(err.kind, ChatErrorKind::Upstream);
            assert_eq!(err.status, Some(terminal));
            assert_eq!(transport.calls(), 1, "status {terminal} must not be retried");
        }
    }

    #[tokio::test]
    async fn test_retryable_status_on_last_attempt_is_returned() {
        let transport = ScriptedTransport::new(vec![status(503), status(503), status(503), ok_body()]);
        let client = scripted_client(transport.clone(), 2);

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "OpenRouter request failed with status 503.");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_network_errors_retry_then_surface() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Network("connection reset".to_string())),
            Err(TransportError::Network("connection reset".to_string())),
        ]);
        let client = scripted_client(transport.clone(), 1);

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::Transport);
        assert_eq!(err.status, None);
        assert_eq!(err.details.as_deref(), Some("network error: connection reset"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_error_then_success() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Network("refused".to_string())), ok_body()]);
        let client = scripted_client(transport.clone(), 2);

        assert!(client.create_chat_completion(&request()).await.is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let transport = ScriptedTransport::new(vec![status(500), ok_body()]);
        let client = scripted_client(transport.clone(), 0);

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(transport.calls(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_wire_format_against_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .and(header("x-title", "flashdeck"))
            .and(body_json(json!({
                "model": "openai/gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hi"}],
                "temperature": 0.3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::builder()
            .api_key("sk-test")
            .base_url(format!("{}/", server.uri()))
            .app_name("flashdeck")
            .build()
            .unwrap();

        let completion = client.create_chat_completion(&request()).await.unwrap();
        assert_eq!(completion.model, "openai/gpt-4o-mini");
        assert_eq!(completion.created, 1_700_000_000);
        assert_eq!(completion.first_content(), Some("Hello"));
        assert_eq!(completion.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test_log::test(tokio::test)]
    async fn test_retries_against_flaky_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::builder()
            .api_key("sk-test")
            .base_url(server.uri())
            .min_retry_delay(Duration::from_millis(1))
            .build()
            .unwrap();

        let completion = client.create_chat_completion(&request()).await.unwrap();
        assert_eq!(completion.id, "gen-123");
    }

    #[tokio::test]
    async fn test_provider_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Invalid model", "code": "bad_model"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionClient::builder()
            .api_key("sk-test")
            .base_url(server.uri())
            .build()
            .unwrap();

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::Upstream);
        assert_eq!(err.message, "Invalid model");
        assert_eq!(err.code.as_deref(), Some("bad_model"));
        assert_eq!(err.status, Some(400));
        assert!(err.details.unwrap().contains("bad_model"));
    }

    #[tokio::test]
    async fn test_undecodable_success_body_has_no_status() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse {
            status: 200,
            body: "<html>gateway page</html>".to_string(),
        })]);
        let client = scripted_client(transport.clone(), 2);

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::Upstream);
        assert_eq!(err.status, None);
        assert_eq!(err.message, "Failed to contact OpenRouter.");
        assert_eq!(err.details.as_deref(), Some("<html>gateway page</html>"));
        assert_eq!(transport.calls(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_max_retry_count_does_not_overflow() {
        let transport = ScriptedTransport::new(vec![status(503), ok_body()]);
        let client = scripted_client(transport.clone(), u32::MAX);

        let completion = client.create_chat_completion(&request()).await.unwrap();
        assert_eq!(completion.id, "gen-123");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout_aborts_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_json())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ChatCompletionClient::builder()
            .api_key("sk-test")
            .base_url(server.uri())
            .max_retries(1)
            .min_retry_delay(Duration::from_millis(1))
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let err = client.create_chat_completion(&request()).await.unwrap_err();
        assert_eq!(err.kind, ChatErrorKind::Transport);
        assert!(err.details.unwrap().contains("timed out"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }
}
