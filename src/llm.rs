//! Chat completion models used to answer questions.

use crate::config::LlmSettings;
use crate::error::{PaddockError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// A model that completes a prompt under a system instruction.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier, for logs and diagnostics.
    fn model(&self) -> &str;
}

/// Groq-hosted model behind the OpenAI-compatible chat completions API.
pub struct GroqChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl GroqChatModel {
    /// Create a model client from settings. Requires `GROQ_API_KEY`.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaddockError::Config("GROQ_API_KEY is not set".to_string()))?;

        let client = create_client(Some(&settings.api_base), Some(api_key))?;
        Ok(Self::with_client(client, &settings.model, settings.temperature))
    }

    pub fn with_client(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for GroqChatModel {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| PaddockError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| PaddockError::Llm(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| PaddockError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PaddockError::Llm(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PaddockError::Llm("Empty response from LLM".to_string()))?;

        debug!("Generated {} chars", answer.len());
        Ok(answer)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed answer and records the prompts it saw.
    pub struct ScriptedChatModel {
        answer: Option<String>,
        pub prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedChatModel {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                answer: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChatModel {
        async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            self.answer
                .clone()
                .ok_or_else(|| PaddockError::Llm("rate limited".to_string()))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }
}
