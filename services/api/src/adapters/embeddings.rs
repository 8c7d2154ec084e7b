//! services/api/src/adapters/embeddings.rs
//!
//! This module contains the adapter for the embedding model.
//! It implements the `EmbeddingProvider` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;

use notes_core::ports::{EmbeddingProvider, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EmbeddingProvider` using an OpenAI-compatible
/// embedding model.
#[derive(Clone)]
pub struct OpenAiEmbeddingAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbeddingAdapter {
    /// Creates a new `OpenAiEmbeddingAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `EmbeddingProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingAdapter {
    async fn embed(&self, text: &str) -> PortResult<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()
            .map_err(|e| PortError::Embedding(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Embedding(e.to_string()))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| {
                PortError::Embedding("model returned no embedding data".to_string())
            })?;

        if embedding.is_empty() {
            return Err(PortError::Embedding(
                "model returned an empty vector".to_string(),
            ));
        }
        Ok(embedding)
    }
}
