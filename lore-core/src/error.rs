use thiserror::Error;

/// Application-level failure of a pipeline or sync operation.
///
/// Capability clients have their own error enums; the server subsystems
/// translate those into one of these kinds and record which step failed.
#[derive(Error, Debug)]
pub enum LoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Embedding failed ({step}): {reason}")]
    Embedding { step: &'static str, reason: String },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Store error ({step}): {reason}")]
    Store { step: &'static str, reason: String },

    #[error("Vector sync failed for entry {id}: {reason}")]
    VectorSync { id: i64, reason: String },

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl LoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for errors caused by the caller rather than a downstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
