//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the generation endpoint.
//! It implements the `GenerationService` port from the `core` crate against any
//! OpenAI-compatible chat completion API (Gemini exposes one).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use reviewiz_core::ports::{GenerationService, PortError, PortResult};
use tracing::{error, info};

use crate::config::GenerationConfig;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the client from the loaded configuration.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base);
        }
        Self::new(Client::with_config(openai_config), config.model.clone())
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiGenerationAdapter {
    /// Sends the prompt as a single user message; no retry.
    async fn generate(&self, prompt: &str) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!("Submitting generation request ({} chars) to {}", prompt.len(), self.model);
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!("Generation request failed: {}", e);
                PortError::Generation(e.to_string())
            })?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Generation("Generation response contained no text content.".to_string())
            })
    }
}
