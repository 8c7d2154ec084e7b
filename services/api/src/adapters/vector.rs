//! services/api/src/adapters/vector.rs
//!
//! This module contains the adapter for the external vector index.
//! It implements the `VectorIndex` port from the `core` crate against a
//! Pinecone-style REST API: upsert and delete by id, and nearest-neighbor
//! queries filtered on the owner id carried in entry metadata.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use notes_core::domain::{VectorMatch, VectorRecord};
use notes_core::ports::{PortError, PortResult, VectorIndex};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<WireVector>,
}

#[derive(Serialize)]
struct WireVector {
    id: String,
    values: Vec<f32>,
    metadata: WireMetadata,
}

#[derive(Serialize)]
struct WireMetadata {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Serialize)]
struct QueryRequest {
    vector: Vec<f32>,
    #[serde(rename = "topK")]
    top_k: usize,
    filter: serde_json::Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
}

#[derive(Serialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `VectorIndex` against a Pinecone-style index.
#[derive(Clone)]
pub struct PineconeIndexAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PineconeIndexAdapter {
    /// Creates a new `PineconeIndexAdapter`. `base_url` is the index host,
    /// without a trailing slash.
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> PortResult<reqwest::Response> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("vector index request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "vector index returned {} for {}",
                response.status(),
                path
            )));
        }
        Ok(response)
    }
}

//=========================================================================================
// `VectorIndex` Trait Implementation
//=========================================================================================

#[async_trait]
impl VectorIndex for PineconeIndexAdapter {
    async fn upsert(&self, record: VectorRecord) -> PortResult<()> {
        let body = UpsertRequest {
            vectors: vec![WireVector {
                id: record.id.to_string(),
                values: record.values,
                metadata: WireMetadata {
                    user_id: record.owner_id.to_string(),
                },
            }],
        };
        self.post("/vectors/upsert", &body).await?;
        Ok(())
    }

    async fn query(
        &self,
        values: &[f32],
        top_k: usize,
        owner_id: Uuid,
    ) -> PortResult<Vec<VectorMatch>> {
        let body = QueryRequest {
            vector: values.to_vec(),
            top_k,
            filter: serde_json::json!({ "userId": { "$eq": owner_id.to_string() } }),
        };
        let response = self.post("/query", &body).await?;
        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("vector index response invalid: {}", e)))?;

        parsed
            .matches
            .into_iter()
            .map(|m| {
                let id = Uuid::parse_str(&m.id).map_err(|_| {
                    PortError::Unexpected(format!("vector index returned non-uuid id '{}'", m.id))
                })?;
                Ok(VectorMatch { id, score: m.score })
            })
            .collect()
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        let body = DeleteRequest {
            ids: vec![id.to_string()],
        };
        self.post("/vectors/delete", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_body_carries_owner_metadata() {
        let body = UpsertRequest {
            vectors: vec![WireVector {
                id: "abc".to_string(),
                values: vec![0.1, 0.2],
                metadata: WireMetadata {
                    user_id: "u1".to_string(),
                },
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["vectors"][0]["metadata"]["userId"], "u1");
    }

    #[test]
    fn query_body_uses_top_k_casing_and_eq_filter() {
        let owner = Uuid::new_v4();
        let body = QueryRequest {
            vector: vec![0.5],
            top_k: 1,
            filter: serde_json::json!({ "userId": { "$eq": owner.to_string() } }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 1);
        assert_eq!(json["filter"]["userId"]["$eq"], owner.to_string());
    }

    #[test]
    fn query_response_with_no_matches_parses_to_empty() {
        let parsed: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.matches.is_empty());
    }
}
