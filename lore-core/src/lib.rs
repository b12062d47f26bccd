pub mod cloudflare;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod memory;
pub mod models;
pub mod pg_store;
pub mod pg_vector;
pub mod store;
pub mod vector_index;
pub mod vectorize;
pub mod workers_ai;

pub use config::LoreConfig;
pub use embeddings::{EmbeddingBackend, EmbeddingError};
pub use error::LoreError;
pub use generation::{ChatMessage, GenerationBackend, GenerationError, Role};
pub use memory::{InMemoryQaStore, InMemoryVectorIndex};
pub use models::{QaEntry, UpsertResult, VectorEntry, VectorMatch};
pub use pg_store::PgQaStore;
pub use pg_vector::PgVectorIndex;
pub use store::{QaStore, StoreError};
pub use vector_index::{VectorError, VectorIndex};
pub use vectorize::VectorizeIndex;
pub use workers_ai::{WorkersAiClient, WorkersAiConfig};
