//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting operations
//! that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{DocQaError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds chunks and builds the engine.
    Ingest,
    /// Asking questions requires the language model key.
    Ask,
    /// Search only needs the embedder.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask => {
            check_key(&settings.llm.api_key_env)?;
            check_embedding_key(settings)?;
        }
        Operation::Search => {
            check_embedding_key(settings)?;
        }
    }
    Ok(())
}

fn check_embedding_key(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::FastEmbed | EmbeddingProvider::Hashing => Ok(()),
        EmbeddingProvider::OpenAI => check_key(&settings.embedding.api_key_env),
    }
}

/// Check that an API key environment variable is set and non-empty.
fn check_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(DocQaError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(DocQaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_search_with_local_embeddings() {
        // Local embeddings need no key
        assert!(check(Operation::Search, &Settings::default()).is_ok());
    }

    #[test]
    fn test_ask_requires_llm_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "DOCQA_TEST_UNSET_PREFLIGHT_KEY".to_string();
        let err = check(Operation::Ask, &settings).unwrap_err();
        assert!(matches!(err, DocQaError::Config(_)));
        assert!(err.to_string().contains("DOCQA_TEST_UNSET_PREFLIGHT_KEY"));
    }
}
