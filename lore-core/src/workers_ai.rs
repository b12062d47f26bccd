//! Cloudflare Workers AI client: embeddings and chat generation.
//!
//! One HTTP client serves both `EmbeddingBackend` and `GenerationBackend`.
//! Both call `POST {base}/accounts/{account}/ai/run/{model}`:
//! - embeddings send `{"text": [...]}` and read `result.data[0]`
//! - generation sends `{"messages": [...]}` and reads `result.response`
//!
//! Calls are made once. Failures are reported, never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cloudflare::{self, ApiOutcome, CloudflareAccount};
use crate::embeddings::{EmbeddingBackend, EmbeddingError};
use crate::generation::{ChatMessage, GenerationBackend, GenerationError};

/// Workers AI client configuration
#[derive(Debug, Clone)]
pub struct WorkersAiConfig {
    pub account: CloudflareAccount,
    pub embedding_model: String,
    pub dimensions: usize,
    pub generation_model: String,
    pub timeout_seconds: u64,
}

impl WorkersAiConfig {
    pub fn from_config(config: &crate::LoreConfig) -> Self {
        Self {
            account: CloudflareAccount::from_env(&config.cloudflare.base_url),
            embedding_model: config.embedding.model.clone(),
            dimensions: config.embedding.dimensions,
            generation_model: config.generation.model.clone(),
            timeout_seconds: config.cloudflare.timeout_seconds,
        }
    }
}

// ============================================================================
// Workers AI API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResult {
    #[serde(default)]
    data: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResult {
    response: Option<String>,
}

// ============================================================================
// WorkersAiClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct WorkersAiClient {
    client: Client,
    config: WorkersAiConfig,
}

impl WorkersAiClient {
    pub fn new(config: WorkersAiConfig) -> Result<Self, EmbeddingError> {
        if !config.account.is_complete() {
            return Err(EmbeddingError::MissingCredentials);
        }

        let client = cloudflare::build_http_client(config.timeout_seconds)?;

        Ok(Self { client, config })
    }

    fn run_url(&self, model: &str) -> String {
        format!("{}/ai/run/{}", self.config.account.account_url(), model)
    }

    /// Embed text and return the raw vector, or `None` if the API sent no rows.
    pub async fn embed_raw(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(self.run_url(&self.config.embedding_model))
            .bearer_auth(&self.config.account.api_token)
            .json(&EmbedRequest { text: vec![text] })
            .send()
            .await?;

        let result = match cloudflare::read_envelope::<EmbedResult>(response).await? {
            ApiOutcome::Ok(result) => result,
            ApiOutcome::Failed { code, message } => {
                tracing::error!(code = code, message = %message, "Workers AI embedding error");
                return Err(EmbeddingError::Api { code, message });
            }
        };

        let Some(values) = result.and_then(|r| r.data.into_iter().next()) else {
            return Ok(None);
        };

        if values.len() != self.config.dimensions {
            return Err(EmbeddingError::InvalidDimensions {
                expected: self.config.dimensions,
                actual: values.len(),
            });
        }

        Ok(Some(values))
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<String>, GenerationError> {
        let response = self
            .client
            .post(self.run_url(&self.config.generation_model))
            .bearer_auth(&self.config.account.api_token)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        match cloudflare::read_envelope::<ChatResult>(response).await? {
            ApiOutcome::Ok(result) => Ok(result
                .and_then(|r| r.response)
                .filter(|text| !text.is_empty())),
            ApiOutcome::Failed { code, message } => {
                tracing::error!(code = code, message = %message, "Workers AI generation error");
                Err(GenerationError::Api { code, message })
            }
        }
    }
}

#[async_trait]
impl EmbeddingBackend for WorkersAiClient {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.embed_raw(text).await
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "workers-ai"
    }
}

#[async_trait]
impl GenerationBackend for WorkersAiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>, GenerationError> {
        self.chat(messages).await
    }

    fn name(&self) -> &str {
        "workers-ai"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMBED_PATH: &str = "/accounts/acct-1/ai/run/@cf/baai/bge-base-en-v1.5";
    const CHAT_PATH: &str = "/accounts/acct-1/ai/run/@cf/meta/llama-2-7b-chat-int8";

    fn test_config(base_url: &str, token: &str) -> WorkersAiConfig {
        WorkersAiConfig {
            account: CloudflareAccount {
                account_id: "acct-1".to_string(),
                api_token: token.to_string(),
                base_url: base_url.to_string(),
            },
            embedding_model: "@cf/baai/bge-base-en-v1.5".to_string(),
            dimensions: 8,
            generation_model: "@cf/meta/llama-2-7b-chat-int8".to_string(),
            timeout_seconds: 5,
        }
    }

    fn embed_body(values: Vec<f32>) -> serde_json::Value {
        let dims = values.len();
        serde_json::json!({
            "result": { "shape": [1, dims], "data": [values] },
            "success": true,
            "errors": [],
            "messages": []
        })
    }

    #[tokio::test]
    async fn test_embed_posts_text_and_returns_vector() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret"))
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path(EMBED_PATH))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(serde_json::json!({ "text": ["hello world"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embed_body(vec![0.5; 8])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let embedding = client.embed("hello world").await.unwrap();
        assert_eq!(embedding, Some(vec![0.5; 8]));
        assert_eq!(EmbeddingBackend::name(&client), "workers-ai");
        assert_eq!(client.dimensions(), 8);
    }

    #[tokio::test]
    async fn test_embed_api_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "result": null,
                "success": false,
                "errors": [{ "code": 3010, "message": "Internal error" }],
                "messages": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client.embed("hello").await {
            Err(EmbeddingError::Api { code, message }) => {
                assert_eq!(code, 3010);
                assert_eq!(message, "Internal error");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_non_json_error_uses_http_status() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&mock_server)
            .await;

        match client.embed("hello").await {
            Err(EmbeddingError::Api { code, message }) => {
                assert_eq!(code, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_wrong_dimensions() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embed_body(vec![0.1, 0.2, 0.3])))
            .mount(&mock_server)
            .await;

        match client.embed("hello").await {
            Err(EmbeddingError::InvalidDimensions { expected, actual }) => {
                assert_eq!(expected, 8);
                assert_eq!(actual, 3);
            }
            other => panic!("Expected InvalidDimensions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embed_empty_data_returns_none() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "shape": [0], "data": [] },
                "success": true,
                "errors": []
            })))
            .mount(&mock_server)
            .await;

        assert_eq!(client.embed("hello").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let result = WorkersAiClient::new(test_config("http://localhost:1", ""));
        assert!(matches!(result, Err(EmbeddingError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_generate_sends_messages_and_returns_text() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(body_json(serde_json::json!({
                "messages": [
                    { "role": "system", "content": "persona" },
                    { "role": "user", "content": "What is the capital of France?" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "response": "Paris." },
                "success": true,
                "errors": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let messages = vec![
            ChatMessage::system("persona"),
            ChatMessage::user("What is the capital of France?"),
        ];
        let reply = client.generate(&messages).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Paris."));
    }

    #[tokio::test]
    async fn test_generate_without_response_returns_none() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {},
                "success": true,
                "errors": []
            })))
            .mount(&mock_server)
            .await;

        let reply = client.generate(&[ChatMessage::user("hi")]).await.unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_generate_success_false_is_api_error() {
        let mock_server = MockServer::start().await;
        let client = WorkersAiClient::new(test_config(&mock_server.uri(), "secret")).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": null,
                "success": false,
                "errors": [{ "code": 5007, "message": "No such model" }]
            })))
            .mount(&mock_server)
            .await;

        match client.generate(&[ChatMessage::user("hi")]).await {
            Err(GenerationError::Api { code, message }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "No such model");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
