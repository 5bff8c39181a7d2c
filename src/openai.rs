//! Client construction for OpenAI-compatible APIs.

use crate::error::{DocQaError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection parameters for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL; None keeps the OpenAI default.
    pub api_base: Option<String>,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_base: None,
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Create a client for an OpenAI-compatible API with a bounded request timeout.
pub fn create_client(options: &ClientOptions) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| DocQaError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new().with_api_key(options.api_key.as_str());
    if let Some(base) = &options.api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_options_builder() {
        let options = ClientOptions::new("sk-test")
            .with_api_base("https://api.groq.com/openai/v1/")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(options.api_key, "sk-test");
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(create_client(&options).is_ok());
    }
}
