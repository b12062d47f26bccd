//! Answer pipeline: retrieval-augmented generation for one question
//!
//! Strictly sequential, one pass, no retries:
//! 1. embed the question
//! 2. query the vector index for the `top_k` nearest entries
//! 3. keep matches scoring strictly above `similarity_cutoff`
//! 4. load the surviving entries' answers in one store lookup
//! 5. build `[context?, persona, question]` and generate
//!
//! An empty context is not an error; the model then answers ungrounded.

use lore_core::config::RetrievalConfig;
use lore_core::{ChatMessage, LoreError, VectorMatch};

use crate::services::Services;

/// Answer `question` using retrieved QA entries as context.
pub async fn answer_question(
    question: &str,
    services: &Services,
    retrieval: &RetrievalConfig,
    persona: &str,
) -> Result<String, LoreError> {
    if question.is_empty() {
        return Err(LoreError::invalid("Missing question"));
    }

    let query_vector = match services.embedder.embed(question).await {
        Ok(Some(v)) => v,
        Ok(None) => {
            return Err(LoreError::Embedding {
                step: "embed question",
                reason: "no vector returned".to_string(),
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to embed question");
            return Err(LoreError::Embedding {
                step: "embed question",
                reason: e.to_string(),
            });
        }
    };

    let matches = services
        .index
        .query(&query_vector, retrieval.top_k)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, index = services.index.name(), "Vector query failed");
            LoreError::Retrieval(e.to_string())
        })?;

    let accepted = filter_matches(matches, retrieval.similarity_cutoff);
    tracing::debug!(
        accepted = accepted.len(),
        cutoff = retrieval.similarity_cutoff,
        "Filtered matches"
    );

    let context = load_context(&accepted, services).await?;
    let messages = build_messages(&context, persona, question);

    match services.generator.generate(&messages).await {
        Ok(Some(text)) => Ok(text),
        Ok(None) => Err(LoreError::Generation("no text returned".to_string())),
        Err(e) => {
            tracing::error!(error = %e, "Generation failed");
            Err(LoreError::Generation(e.to_string()))
        }
    }
}

/// Keep matches whose score is strictly greater than `cutoff`.
pub fn filter_matches(matches: Vec<VectorMatch>, cutoff: f64) -> Vec<VectorMatch> {
    matches.into_iter().filter(|m| m.score > cutoff).collect()
}

/// Answers of the matched entries, in the order the store returns them.
async fn load_context(
    matches: &[VectorMatch],
    services: &Services,
) -> Result<Vec<String>, LoreError> {
    let ids: Vec<i64> = matches
        .iter()
        .filter_map(|m| {
            let id = m.entry_id();
            if id.is_none() {
                tracing::warn!(vector_id = %m.id, "Skipping vector match with non-numeric id");
            }
            id
        })
        .collect();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = services
        .store
        .find_by_ids(&ids)
        .await
        .map_err(|e| LoreError::Store {
            step: "load context",
            reason: e.to_string(),
        })?;

    Ok(rows.into_iter().map(|row| row.answer).collect())
}

/// `"Context:\n- a\n- b"`.
pub fn context_message(answers: &[String]) -> String {
    let bullets: Vec<String> = answers.iter().map(|a| format!("- {}", a)).collect();
    format!("Context:\n{}", bullets.join("\n"))
}

pub fn build_messages(context: &[String], persona: &str, question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(3);
    if !context.is_empty() {
        messages.push(ChatMessage::system(context_message(context)));
    }
    messages.push(ChatMessage::system(persona));
    messages.push(ChatMessage::user(question));
    messages
}

// ============================================================================
// TESTS
// ============================================================================
