//! services/api/src/adapters/responder.rs
//!
//! This module contains the adapter for the generative model that answers
//! chat questions. It implements the `Responder` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use notes_core::ports::{PortError, PortResult, Responder};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `Responder` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiResponderAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiResponderAdapter {
    /// Creates a new `OpenAiResponderAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `Responder` Trait Implementation
//=========================================================================================

#[async_trait]
impl Responder for OpenAiResponderAdapter {
    /// Generates a plain-text answer for an already-grounded prompt. The
    /// prompt composition happens in the core chat flow; this adapter only
    /// transports it.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You answer questions about a user's personal notes.")
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::Unexpected(
                    "Chat model response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Chat model returned no choices in its response.".to_string(),
            ))
        }
    }
}
