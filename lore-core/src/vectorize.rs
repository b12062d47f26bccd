//! Cloudflare Vectorize (v2 REST API) `VectorIndex`.
//!
//! Endpoints under `{base}/accounts/{account}/vectorize/v2/indexes/{index}`:
//! - `POST /query`          `{"vector", "topK", "returnValues", "returnMetadata"}`
//! - `POST /upsert`         NDJSON, one `{"id", "values"}` per line
//! - `POST /delete_by_ids`  `{"ids": [...]}`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cloudflare::{self, ApiOutcome, CloudflareAccount};
use crate::models::{UpsertResult, VectorEntry, VectorMatch};
use crate::vector_index::{VectorError, VectorIndex};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: u32,
    return_values: bool,
    return_metadata: &'static str,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationResult {
    mutation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Clone)]
pub struct VectorizeIndex {
    client: Client,
    account: CloudflareAccount,
    index_name: String,
}

impl VectorizeIndex {
    pub fn new(
        account: CloudflareAccount,
        index_name: impl Into<String>,
        timeout_seconds: u64,
    ) -> Result<Self, VectorError> {
        if !account.is_complete() {
            return Err(VectorError::MissingCredentials);
        }

        Ok(Self {
            client: cloudflare::build_http_client(timeout_seconds)?,
            account,
            index_name: index_name.into(),
        })
    }

    fn index_url(&self, op: &str) -> String {
        format!(
            "{}/vectorize/v2/indexes/{}/{}",
            self.account.account_url(),
            self.index_name,
            op
        )
    }

    async fn finish<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        op: &'static str,
    ) -> Result<Option<T>, VectorError> {
        match cloudflare::read_envelope::<T>(response).await? {
            ApiOutcome::Ok(result) => Ok(result),
            ApiOutcome::Failed { code, message } => {
                tracing::error!(op, code = code, message = %message, "Vectorize API error");
                Err(VectorError::Api { code, message })
            }
        }
    }
}

/// Serialize entries as newline-delimited JSON.
pub fn to_ndjson(entries: &[VectorEntry]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for entry in entries {
        body.push_str(&serde_json::to_string(entry)?);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl VectorIndex for VectorizeIndex {
    async fn upsert(&self, entries: &[VectorEntry]) -> Result<UpsertResult, VectorError> {
        let body = to_ndjson(entries)?;

        let response = self
            .client
            .post(self.index_url("upsert"))
            .bearer_auth(&self.account.api_token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let mutation: Option<MutationResult> = self.finish(response, "upsert").await?;

        let mut result = UpsertResult::for_entries(entries);
        result.mutation_id = mutation.and_then(|m| m.mutation_id);
        Ok(result)
    }

    async fn query(&self, vector: &[f32], top_k: u32) -> Result<Vec<VectorMatch>, VectorError> {
        let response = self
            .client
            .post(self.index_url("query"))
            .bearer_auth(&self.account.api_token)
            .json(&QueryRequest {
                vector,
                top_k,
                return_values: false,
                return_metadata: "none",
            })
            .send()
            .await?;

        let result: Option<QueryResult> = self.finish(response, "query").await?;
        Ok(result.map(|r| r.matches).unwrap_or_default())
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize, VectorError> {
        let response = self
            .client
            .post(self.index_url("delete_by_ids"))
            .bearer_auth(&self.account.api_token)
            .json(&DeleteRequest { ids })
            .send()
            .await?;

        // v2 deletes are asynchronous; the API only acknowledges the mutation.
        let _: Option<MutationResult> = self.finish(response, "delete_by_ids").await?;
        Ok(ids.len())
    }

    fn name(&self) -> &str {
        "vectorize"
    }
}
