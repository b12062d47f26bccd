use serde::{Deserialize, Serialize};

/// Embedding of a QA entry's question, keyed by the entry id in string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f64,
}

impl VectorMatch {
    /// Parse the match id back into a QA entry id.
    pub fn entry_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

/// Acknowledgement of an upsert, echoed to API callers on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertResult {
    pub count: usize,
    pub ids: Vec<String>,
    #[serde(rename = "mutationId", skip_serializing_if = "Option::is_none", default)]
    pub mutation_id: Option<String>,
}

impl UpsertResult {
    pub fn for_entries(entries: &[VectorEntry]) -> Self {
        Self {
            count: entries.len(),
            ids: entries.iter().map(|e| e.id.clone()).collect(),
            mutation_id: None,
        }
    }
}
