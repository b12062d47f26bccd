//! Nearest-neighbour index seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{UpsertResult, VectorEntry, VectorMatch};

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries by id.
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<UpsertResult, VectorError>;

    /// Up to `top_k` matches, best first.
    async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<VectorMatch>, VectorError>;

    /// Remove entries by id. Returns how many the index reports removed.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, VectorError>;

    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u32, message: String },

    #[error("Missing Cloudflare account id or API token")]
    MissingCredentials,

    #[error("Failed to encode upsert body: {0}")]
    Encode(#[from] serde_json::Error),
}
