use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Installed version of the `vector` extension; fails if it is missing.
pub async fn check_pgvector(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) =
        sqlx::query_as("SELECT extversion FROM pg_extension WHERE extname = 'vector'")
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

/// Create the QA table, and the vector table when `vector_dimensions` is set.
/// Safe to run on every start.
pub async fn ensure_schema(
    pool: &PgPool,
    vector_dimensions: Option<usize>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS qa_entries (
            id BIGSERIAL PRIMARY KEY,
            question TEXT NOT NULL,
            answer TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    if let Some(dims) = vector_dimensions {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS qa_vectors (
                id TEXT PRIMARY KEY,
                embedding vector({dims}) NOT NULL
            )"
        ))
        .execute(pool)
        .await?;
    }

    tracing::debug!(vector_table = vector_dimensions.is_some(), "Schema ensured");
    Ok(())
}
