//! pgvector-backed `VectorIndex`.
//!
//! Score = 1 - cosine_distance, so identical directions score 1.0.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::PgPool;

use crate::models::{UpsertResult, VectorEntry, VectorMatch};
use crate::vector_index::{VectorError, VectorIndex};

#[derive(Debug, Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<UpsertResult, VectorError> {
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let vector = Vector::from(entry.values.clone());
            sqlx::query(
                r#"
                INSERT INTO qa_vectors (id, embedding) VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET embedding = EXCLUDED.embedding
                "#,
            )
            .bind(&entry.id)
            .bind(&vector)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(UpsertResult::for_entries(entries))
    }

    async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<VectorMatch>, VectorError> {
        let vector = Vector::from(vector.to_vec());

        let rows = sqlx::query_as::<_, (String, f64)>(
            r#"
            SELECT
                id,
                (1 - (embedding <=> $1::vector))::float8 AS score
            FROM qa_vectors
            ORDER BY embedding <=> $1::vector
            LIMIT $2
            "#,
        )
        .bind(&vector)
        .bind(i64::from(top_k))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, score)| VectorMatch { id, score })
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, VectorError> {
        let result = sqlx::query("DELETE FROM qa_vectors WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    fn name(&self) -> &str {
        "pgvector"
    }
}
