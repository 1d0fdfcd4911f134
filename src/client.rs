use crate::config::ApiConfig;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Anything that turns a rendered prompt into reply text.
///
/// Every call is a single attempt; implementations must not retry.
pub trait CompletionBackend {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

/// Chat-completion client for an OpenAI-compatible endpoint
pub struct InferenceClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u16,
}

impl InferenceClient {
    /// Create a client, reading the API key from the configured environment variable
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn new(config: &ApiConfig, api_key: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&config.api_endpoint);

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(single_attempt());

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the chat completion request for a single user prompt
    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let user_message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .context("Failed to build user message")?
            .into();

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([user_message])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .context("Failed to build chat completion request")
    }

    /// Text of the first choice
    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Response contained no message content")
    }
}

impl CompletionBackend for InferenceClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt)?;
        debug!(model = %self.model, prompt_chars = prompt.len(), "sending chat completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Failed to generate response")?;

        Self::extract_content(response)
    }
}

/// Backoff policy that gives up before the first retry
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..ExponentialBackoff::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_config(endpoint: &str) -> ApiConfig {
        ApiConfig {
            api_endpoint: endpoint.to_string(),
            model: "test-model".to_string(),
            ..ApiConfig::default()
        }
    }

    fn completion_body(content: &str) -> String {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop",
                "logprobs": null
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"model": "test-model"})),
                Matcher::Regex(r#""role":"user""#.to_string()),
                Matcher::Regex("rate this".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body(r#"{"predicted_stars": 4}"#))
            .expect(1)
            .create_async()
            .await;

        let client = InferenceClient::new(&test_config(&server.url()), "secret".to_string()).unwrap();
        let reply = client.complete("rate this").await.unwrap();

        assert_eq!(reply, r#"{"predicted_stars": 4}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_does_not_retry_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .expect(1)
            .create_async()
            .await;

        let client = InferenceClient::new(&test_config(&server.url()), "secret".to_string()).unwrap();
        let result = client.complete("rate this").await;

        assert!(result.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error", "code": "invalid_api_key"}})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = InferenceClient::new(&test_config(&server.url()), "wrong".to_string()).unwrap();
        let err = client.complete("rate this").await.unwrap_err();

        assert!(err.to_string().contains("Failed to generate response"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_without_content() {
        let mut server = Server::new_async().await;
        let body = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "test-model",
            "choices": []
        });
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = InferenceClient::new(&test_config(&server.url()), "secret".to_string()).unwrap();
        let err = client.complete("rate this").await.unwrap_err();

        assert!(err.to_string().contains("no message content"));
    }

    #[tokio::test]
    async fn test_complete_times_out_on_silent_server() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Instant;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            // Hold every connection open without ever answering.
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        let config = ApiConfig {
            timeout_secs: 1,
            ..test_config(&format!("http://{addr}"))
        };
        let client = InferenceClient::new(&config, "secret".to_string()).unwrap();

        let start = Instant::now();
        let result = client.complete("rate this").await;
        let elapsed = start.elapsed();

        assert!(result.is_err());
        assert!(elapsed >= Duration::from_millis(900), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_missing_env_var() {
        let config = ApiConfig {
            env_var_api_key: "STAR_RATING_EVAL_CLIENT_UNSET_KEY".to_string(),
            ..ApiConfig::default()
        };

        let result = InferenceClient::from_config(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_attempt_backoff() {
        use backoff::backoff::Backoff;

        let mut policy = single_attempt();
        policy.reset();
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(policy.next_backoff(), None);
    }
}
