use serde::{Deserialize, Serialize};

/// A persisted question/answer pair. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QaEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

impl QaEntry {
    /// Key of the mirroring vector entry.
    pub fn vector_id(&self) -> String {
        self.id.to_string()
    }
}
