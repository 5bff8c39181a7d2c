//! Language model access for answer generation.

use crate::config::LlmSettings;
use crate::error::{DocQaError, Result};
use crate::openai::{create_client, ClientOptions};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A text-completion service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a single-turn prompt and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Identifier of the underlying model.
    fn model_name(&self) -> &str;
}

/// Chat model behind an OpenAI-compatible chat-completions endpoint.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIChatModel {
    pub fn new(options: &ClientOptions, model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(options)?,
            model: model.to_string(),
            temperature: None,
        })
    }

    /// Build the model described by the settings, reading the API key from the environment.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let options = ClientOptions::new(settings.api_key()?)
            .with_api_base(settings.api_base.as_str())
            .with_timeout(Duration::from_secs(settings.timeout_secs));

        let mut model = Self::new(&options, &settings.model)?;
        model.temperature = settings.temperature;
        Ok(model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| DocQaError::Generation(e.to_string()))?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.model).messages(vec![message.into()]);
        if let Some(temperature) = self.temperature {
            request.temperature(temperature);
        }
        let request = request
            .build()
            .map_err(|e| DocQaError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DocQaError::Generation(format!("Chat API error: {}", e)))?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DocQaError::Generation("Empty response from LLM".to_string()))?;

        debug!("Received {} characters from {}", answer.len(), self.model);
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_requires_api_key() {
        let settings = LlmSettings {
            api_key_env: "DOCQA_TEST_UNSET_LLM_KEY".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OpenAIChatModel::from_settings(&settings),
            Err(DocQaError::Config(_))
        ));
    }

    #[test]
    fn test_model_construction() {
        let options = ClientOptions::new("gsk-test").with_api_base("https://api.groq.com/openai/v1");
        let model = OpenAIChatModel::new(&options, "mixtral-8x7b-32768")
            .unwrap()
            .with_temperature(0.1);
        assert_eq!(model.model_name(), "mixtral-8x7b-32768");
        assert_eq!(model.temperature, Some(0.1));
    }
}
