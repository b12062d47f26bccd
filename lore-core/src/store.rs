//! Relational store seam for QA entries.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::QaEntry;

#[async_trait]
pub trait QaStore: Send + Sync {
    /// Insert a row and return it with its assigned id.
    async fn insert(&self, question: &str, answer: &str) -> Result<QaEntry, StoreError>;

    /// Every row, ordered by id.
    async fn list(&self) -> Result<Vec<QaEntry>, StoreError>;

    /// Rows whose id is in `ids`, fetched in one lookup.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<QaEntry>, StoreError>;

    /// Rewrite the answer, and the question when one is given.
    /// Returns `None` when no row has this id.
    async fn update(
        &self,
        id: i64,
        answer: &str,
        question: Option<&str>,
    ) -> Result<Option<QaEntry>, StoreError>;

    /// Returns false when no row has this id.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Short description of the backing store, e.g. the server version.
    async fn health(&self) -> Result<String, StoreError>;

    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
