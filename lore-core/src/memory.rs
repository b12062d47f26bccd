//! In-process store and index for local runs and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{QaEntry, UpsertResult, VectorEntry, VectorMatch};
use crate::store::{QaStore, StoreError};
use crate::vector_index::{VectorError, VectorIndex};

#[derive(Default)]
struct Rows {
    next_id: i64,
    entries: BTreeMap<i64, QaEntry>,
}

/// `QaStore` over a map. Ids start at 1 and are never reused.
#[derive(Clone, Default)]
pub struct InMemoryQaStore {
    rows: Arc<RwLock<Rows>>,
}

impl InMemoryQaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QaStore for InMemoryQaStore {
    async fn insert(&self, question: &str, answer: &str) -> Result<QaEntry, StoreError> {
        let mut rows = self.rows.write().await;
        rows.next_id += 1;
        let entry = QaEntry {
            id: rows.next_id,
            question: question.to_string(),
            answer: answer.to_string(),
        };
        rows.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<QaEntry>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.entries.values().cloned().collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<QaEntry>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .entries
            .values()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        answer: &str,
        question: Option<&str>,
    ) -> Result<Option<QaEntry>, StoreError> {
        let mut rows = self.rows.write().await;
        let Some(entry) = rows.entries.get_mut(&id) else {
            return Ok(None);
        };
        entry.answer = answer.to_string();
        if let Some(question) = question {
            entry.question = question.to_string();
        }
        Ok(Some(entry.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        Ok(rows.entries.remove(&id).is_some())
    }

    async fn health(&self) -> Result<String, StoreError> {
        let rows = self.rows.read().await;
        Ok(format!("in-memory ({} entries)", rows.entries.len()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Exhaustive cosine-similarity index.
#[derive(Clone, Default)]
pub struct InMemoryVectorIndex {
    entries: Arc<RwLock<HashMap<String, Vec<f32>>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Vec<f32>> {
        self.entries.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Cosine similarity in [-1, 1]; 0.0 when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<UpsertResult, VectorError> {
        let mut map = self.entries.write().await;
        for entry in entries {
            map.insert(entry.id.clone(), entry.values.clone());
        }
        Ok(UpsertResult::for_entries(entries))
    }

    async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<VectorMatch>, VectorError> {
        let map = self.entries.read().await;
        let mut matches: Vec<VectorMatch> = map
            .iter()
            .map(|(id, values)| VectorMatch {
                id: id.clone(),
                score: cosine_similarity(vector, values),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k as usize);
        Ok(matches)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, VectorError> {
        let mut map = self.entries.write().await;
        Ok(ids.iter().filter(|id| map.remove(*id).is_some()).count())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
