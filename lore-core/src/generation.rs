//! Generation seam: role-tagged messages in, text out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persona given to the model on every request.
pub const DEFAULT_PERSONA: &str = "You are Lore, a friendly and concise assistant. \
Answer the user's question accurately. When context is provided, prefer it over \
your own knowledge, and say so plainly when you do not know the answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a reply. `None` means the model returned no text.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>, GenerationError>;

    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u32, message: String },

    #[error("Missing Cloudflare account id or API token")]
    MissingCredentials,
}
