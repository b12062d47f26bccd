//! Wiring of the four external capabilities from configuration.

use std::sync::Arc;

use lore_core::config::{StoreBackend, VectorBackend};
use lore_core::cloudflare::CloudflareAccount;
use lore_core::{
    EmbeddingBackend, GenerationBackend, InMemoryQaStore, InMemoryVectorIndex, LoreConfig,
    PgQaStore, PgVectorIndex, QaStore, VectorIndex, VectorizeIndex, WorkersAiClient,
    WorkersAiConfig,
};

/// Handles to every collaborator a request may touch. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn EmbeddingBackend>,
    pub generator: Arc<dyn GenerationBackend>,
    pub index: Arc<dyn VectorIndex>,
    pub store: Arc<dyn QaStore>,
}

/// Build services from the application config.
///
/// Opens a Postgres pool only when the store or the index needs one, and
/// bootstraps the tables it will use.
pub async fn build_services(config: &LoreConfig) -> anyhow::Result<Services> {
    let workers = Arc::new(WorkersAiClient::new(WorkersAiConfig::from_config(config))?);

    let needs_pool = config.store.backend == StoreBackend::Postgres
        || config.vector.backend == VectorBackend::Pgvector;

    let pool = if needs_pool {
        let pool = lore_core::db::create_pool(&config.database).await?;
        let vector_dims = (config.vector.backend == VectorBackend::Pgvector)
            .then_some(config.embedding.dimensions);
        lore_core::db::ensure_schema(&pool, vector_dims).await?;
        if vector_dims.is_some() {
            let pgvector = lore_core::db::check_pgvector(&pool).await?;
            tracing::info!(pgvector = %pgvector, "pgvector extension available");
        }
        Some(pool)
    } else {
        None
    };

    let store: Arc<dyn QaStore> = match (config.store.backend, &pool) {
        (StoreBackend::Postgres, Some(pool)) => Arc::new(PgQaStore::new(pool.clone())),
        _ => Arc::new(InMemoryQaStore::new()),
    };

    let index: Arc<dyn VectorIndex> = match (config.vector.backend, &pool) {
        (VectorBackend::Pgvector, Some(pool)) => Arc::new(PgVectorIndex::new(pool.clone())),
        (VectorBackend::Vectorize, _) => Arc::new(VectorizeIndex::new(
            CloudflareAccount::from_env(&config.cloudflare.base_url),
            config.vector.index_name.clone(),
            config.cloudflare.timeout_seconds,
        )?),
        _ => Arc::new(InMemoryVectorIndex::new()),
    };

    tracing::info!(
        store = store.name(),
        vector_index = index.name(),
        embedding_dims = workers.dimensions(),
        "Services ready"
    );

    Ok(Services {
        embedder: workers.clone(),
        generator: workers,
        index,
        store,
    })
}
