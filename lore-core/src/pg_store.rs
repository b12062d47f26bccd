//! Postgres-backed `QaStore`. Every statement is parameterized; id lists
//! are bound as a single array (`id = ANY($1)`).

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::QaEntry;
use crate::store::{QaStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgQaStore {
    pool: PgPool,
}

impl PgQaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QaStore for PgQaStore {
    async fn insert(&self, question: &str, answer: &str) -> Result<QaEntry, StoreError> {
        let entry = sqlx::query_as::<_, QaEntry>(
            "INSERT INTO qa_entries (question, answer) VALUES ($1, $2) \
             RETURNING id, question, answer",
        )
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<QaEntry>, StoreError> {
        let rows = sqlx::query_as::<_, QaEntry>(
            "SELECT id, question, answer FROM qa_entries ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<QaEntry>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, QaEntry>(
            "SELECT id, question, answer FROM qa_entries WHERE id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(
        &self,
        id: i64,
        answer: &str,
        question: Option<&str>,
    ) -> Result<Option<QaEntry>, StoreError> {
        let entry = sqlx::query_as::<_, QaEntry>(
            r#"
            UPDATE qa_entries
            SET answer = $1, question = COALESCE($2, question)
            WHERE id = $3
            RETURNING id, question, answer
            "#,
        )
        .bind(answer)
        .bind(question)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM qa_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health(&self) -> Result<String, StoreError> {
        Ok(crate::db::health_check(&self.pool).await?)
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
