//! Deterministic collaborators for subsystem unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lore_core::{
    ChatMessage, EmbeddingBackend, EmbeddingError, GenerationBackend, GenerationError,
    InMemoryQaStore, InMemoryVectorIndex, QaEntry, QaStore, StoreError, UpsertResult,
    VectorEntry, VectorError, VectorIndex, VectorMatch,
};

use crate::services::Services;

/// Embeds text as a two-dimensional vector derived from its bytes, so equal
/// texts map to equal vectors. Records every input.
#[derive(Default)]
pub struct StubEmbedder {
    pub calls: Mutex<Vec<String>>,
    pub fail: bool,
    pub empty: bool,
}

pub fn vector_for(text: &str) -> Vec<f32> {
    let sum: u32 = text.bytes().map(u32::from).sum();
    vec![1.0, (sum % 97) as f32 / 97.0]
}

#[async_trait]
impl EmbeddingBackend for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(EmbeddingError::Api {
                code: 500,
                message: "embedding service down".to_string(),
            });
        }
        if self.empty {
            return Ok(None);
        }
        Ok(Some(vector_for(text)))
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Returns a fixed reply and keeps the last message list it was given.
pub struct RecordingGenerator {
    pub reply: Option<String>,
    pub last: Mutex<Option<Vec<ChatMessage>>>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last: Mutex::new(None),
        }
    }

    pub fn silent() -> Self {
        Self {
            reply: None,
            last: Mutex::new(None),
        }
    }

    pub fn last_messages(&self) -> Option<Vec<ChatMessage>> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for RecordingGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<Option<String>, GenerationError> {
        *self.last.lock().unwrap() = Some(messages.to_vec());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Index that answers every query with the same matches and can be told to
/// fail writes.
#[derive(Default)]
pub struct FixedIndex {
    pub matches: Vec<VectorMatch>,
    pub fail_queries: bool,
    pub fail_writes: bool,
}

#[async_trait]
impl VectorIndex for FixedIndex {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<UpsertResult, VectorError> {
        if self.fail_writes {
            return Err(VectorError::Api {
                code: 503,
                message: "index unavailable".to_string(),
            });
        }
        Ok(UpsertResult::for_entries(entries))
    }

    async fn query(&self, _vector: &[f32], top_k: u32) -> Result<Vec<VectorMatch>, VectorError> {
        if self.fail_queries {
            return Err(VectorError::Api {
                code: 503,
                message: "index unavailable".to_string(),
            });
        }
        Ok(self.matches.iter().take(top_k as usize).cloned().collect())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, VectorError> {
        if self.fail_writes {
            return Err(VectorError::Api {
                code: 503,
                message: "index unavailable".to_string(),
            });
        }
        Ok(ids.len())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Store whose every call fails as if the pool were exhausted.
pub struct BrokenStore;

fn pool_timeout() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl QaStore for BrokenStore {
    async fn insert(&self, _question: &str, _answer: &str) -> Result<QaEntry, StoreError> {
        Err(pool_timeout())
    }

    async fn list(&self) -> Result<Vec<QaEntry>, StoreError> {
        Err(pool_timeout())
    }

    async fn find_by_ids(&self, _ids: &[i64]) -> Result<Vec<QaEntry>, StoreError> {
        Err(pool_timeout())
    }

    async fn update(
        &self,
        _id: i64,
        _answer: &str,
        _question: Option<&str>,
    ) -> Result<Option<QaEntry>, StoreError> {
        Err(pool_timeout())
    }

    async fn delete(&self, _id: i64) -> Result<bool, StoreError> {
        Err(pool_timeout())
    }

    async fn health(&self) -> Result<String, StoreError> {
        Err(pool_timeout())
    }

    fn name(&self) -> &str {
        "broken"
    }
}

pub fn services_with(
    embedder: Arc<StubEmbedder>,
    generator: Arc<RecordingGenerator>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn QaStore>,
) -> Services {
    Services {
        embedder,
        generator,
        index,
        store,
    }
}

pub fn memory_services() -> (
    Services,
    Arc<StubEmbedder>,
    Arc<InMemoryVectorIndex>,
    Arc<InMemoryQaStore>,
) {
    let embedder = Arc::new(StubEmbedder::default());
    let index = Arc::new(InMemoryVectorIndex::new());
    let store = Arc::new(InMemoryQaStore::new());
    let services = services_with(
        embedder.clone(),
        Arc::new(RecordingGenerator::replying("ok")),
        index.clone(),
        store.clone(),
    );
    (services, embedder, index, store)
}
