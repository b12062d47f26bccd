//! Repository sync: keeps QA rows and their question embeddings aligned
//!
//! - create: insert row, embed question, upsert vector under the new id
//! - update: rewrite row, re-embed the current question, re-upsert
//! - delete: remove row, then remove its vector
//!
//! The two stores share no transaction. A vector failure after a row write
//! is reported, and the row write is kept.

use lore_core::{LoreError, QaEntry, UpsertResult, VectorEntry};
use serde::Serialize;

use crate::services::Services;

/// Result of a successful create.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntry {
    pub entry: QaEntry,
    pub inserted: UpsertResult,
}

/// Why the vector side of a sync failed.
#[derive(Debug)]
enum SyncFailure {
    Embed(String),
    NoVector,
    Upsert(String),
}

impl SyncFailure {
    fn reason(&self) -> String {
        match self {
            Self::Embed(e) => format!("embedding failed: {}", e),
            Self::NoVector => "no vector returned".to_string(),
            Self::Upsert(e) => format!("upsert failed: {}", e),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Embed `entry.question` and upsert it under the entry id.
async fn sync_vector(entry: &QaEntry, services: &Services) -> Result<UpsertResult, SyncFailure> {
    let values = match services.embedder.embed(&entry.question).await {
        Ok(Some(v)) => v,
        Ok(None) => return Err(SyncFailure::NoVector),
        Err(e) => return Err(SyncFailure::Embed(e.to_string())),
    };

    let vector = VectorEntry {
        id: entry.vector_id(),
        values,
    };

    services
        .index
        .upsert(std::slice::from_ref(&vector))
        .await
        .map_err(|e| SyncFailure::Upsert(e.to_string()))
}

pub async fn list_entries(services: &Services) -> Result<Vec<QaEntry>, LoreError> {
    services.store.list().await.map_err(|e| LoreError::Store {
        step: "list rows",
        reason: e.to_string(),
    })
}

pub async fn create_entry(
    question: Option<&str>,
    answer: Option<&str>,
    services: &Services,
) -> Result<CreatedEntry, LoreError> {
    let (Some(question), Some(answer)) = (non_empty(question), non_empty(answer)) else {
        return Err(LoreError::invalid("Missing question or answer"));
    };

    let entry = services
        .store
        .insert(question, answer)
        .await
        .map_err(|e| LoreError::Store {
            step: "insert row",
            reason: e.to_string(),
        })?;

    tracing::info!(id = entry.id, "Inserted QA entry");

    match sync_vector(&entry, services).await {
        Ok(inserted) => Ok(CreatedEntry { entry, inserted }),
        Err(failure) => {
            tracing::warn!(
                id = entry.id,
                reason = %failure.reason(),
                "Row inserted but vector sync failed; row kept without a vector"
            );
            Err(LoreError::VectorSync {
                id: entry.id,
                reason: failure.reason(),
            })
        }
    }
}

/// Rewrite an entry's answer (and question, when given) and re-embed.
///
/// Without a new question the stored one is re-embedded, so the vector
/// always reflects the row's current question text.
pub async fn update_entry(
    id: i64,
    answer: Option<&str>,
    question: Option<&str>,
    services: &Services,
) -> Result<QaEntry, LoreError> {
    let Some(answer) = non_empty(answer) else {
        return Err(LoreError::invalid("Missing answer"));
    };
    let question = non_empty(question);

    let entry = services
        .store
        .update(id, answer, question)
        .await
        .map_err(|e| LoreError::Store {
            step: "update row",
            reason: e.to_string(),
        })?
        .ok_or_else(|| LoreError::Store {
            step: "update row",
            reason: format!("no entry with id {}", id),
        })?;

    tracing::info!(id = id, question_changed = question.is_some(), "Updated QA entry");

    if entry.question.is_empty() {
        tracing::warn!(id = id, "Entry has no question text; vector not refreshed");
        return Ok(entry);
    }

    match sync_vector(&entry, services).await {
        Ok(_) => Ok(entry),
        Err(SyncFailure::Upsert(e)) => Err(LoreError::VectorSync {
            id,
            reason: format!("upsert failed: {}", e),
        }),
        Err(failure) => Err(LoreError::Embedding {
            step: "re-embed question",
            reason: failure.reason(),
        }),
    }
}

/// Delete the row, then its vector entry.
pub async fn delete_entry(id: i64, services: &Services) -> Result<(), LoreError> {
    let deleted = services.store.delete(id).await.map_err(|e| LoreError::Store {
        step: "delete row",
        reason: e.to_string(),
    })?;

    if !deleted {
        return Err(LoreError::Store {
            step: "delete row",
            reason: format!("no entry with id {}", id),
        });
    }

    tracing::info!(id = id, "Deleted QA entry");

    services
        .index
        .delete_by_ids(&[id.to_string()])
        .await
        .map_err(|e| {
            tracing::warn!(id = id, error = %e, "Row deleted but vector entry was not removed");
            LoreError::VectorSync {
                id,
                reason: format!("vector delete failed: {}", e),
            }
        })?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
