//! Shared plumbing for the Cloudflare REST API (Workers AI and Vectorize).
//!
//! Every endpoint wraps its payload in the same envelope:
//! `{"result": ..., "success": bool, "errors": [{"code", "message"}], "messages": [...]}`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Credentials and endpoint for one Cloudflare account.
#[derive(Debug, Clone)]
pub struct CloudflareAccount {
    pub account_id: String,
    pub api_token: String,
    pub base_url: String,
}

impl CloudflareAccount {
    /// Build from `CLOUDFLARE_ACCOUNT_ID` and `CLOUDFLARE_API_TOKEN`.
    /// Missing variables become empty strings and are rejected by the clients.
    pub fn from_env(base_url: &str) -> Self {
        Self {
            account_id: std::env::var("CLOUDFLARE_ACCOUNT_ID").unwrap_or_default(),
            api_token: std::env::var("CLOUDFLARE_API_TOKEN").unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.account_id.is_empty() && !self.api_token.is_empty()
    }

    pub fn account_url(&self) -> String {
        format!("{}/accounts/{}", self.base_url, self.account_id)
    }
}

pub fn build_http_client(timeout_seconds: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: u32,
    pub message: String,
}

/// Outcome of reading a Cloudflare response.
pub enum ApiOutcome<T> {
    Ok(Option<T>),
    Failed { code: u32, message: String },
}

/// Read a response into its envelope. Non-2xx statuses and `success: false`
/// both become `Failed`, using the first envelope error when one is present.
pub async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiOutcome<T>, reqwest::Error> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let (code, message) = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|e| e.errors.into_iter().next())
            .map(|e| (e.code, e.message))
            .unwrap_or((u32::from(status.as_u16()), body));
        return Ok(ApiOutcome::Failed { code, message });
    }

    let envelope: Envelope<T> = response.json().await?;
    if !envelope.success {
        let message = envelope
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "request reported success=false".to_string());
        return Ok(ApiOutcome::Failed {
            code: u32::from(status.as_u16()),
            message,
        });
    }

    Ok(ApiOutcome::Ok(envelope.result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_url_strips_trailing_slash() {
        let account = CloudflareAccount {
            account_id: "abc123".to_string(),
            api_token: "token".to_string(),
            base_url: "http://localhost:9999/".trim_end_matches('/').to_string(),
        };
        assert_eq!(account.account_url(), "http://localhost:9999/accounts/abc123");
        assert!(account.is_complete());
    }

    #[test]
    fn test_incomplete_account() {
        let account = CloudflareAccount {
            account_id: String::new(),
            api_token: "token".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        };
        assert!(!account.is_complete());
    }

    #[test]
    fn test_envelope_parses_errors() {
        let body = r#"{
            "result": null,
            "success": false,
            "errors": [{"code": 7003, "message": "Could not route"}],
            "messages": []
        }"#;
        let envelope: Envelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!envelope.success);
        assert!(envelope.result.is_none());
        assert_eq!(envelope.errors[0].code, 7003);
    }

    #[tokio::test]
    async fn test_large_error_code_is_kept_intact() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "result": null,
                "success": false,
                "errors": [{ "code": 100_001, "message": "bad input" }]
            })))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        match read_envelope::<serde_json::Value>(response).await.unwrap() {
            ApiOutcome::Failed { code, message } => {
                assert_eq!(code, 100_001);
                assert_eq!(message, "bad input");
            }
            ApiOutcome::Ok(_) => panic!("expected a failed outcome"),
        }
    }
}
