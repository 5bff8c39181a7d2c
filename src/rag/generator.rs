//! Answer generation from a context block and a question.

use super::{Answer, LanguageModel};
use crate::config::Prompts;
use crate::error::{DocQaError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Turns a context block and a question into a model answer.
#[derive(Clone)]
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Build the prompt sent for `context` and `question`.
    ///
    /// Whitespace-only context selects the context-free template.
    pub fn build_prompt(&self, context: &str, question: &str) -> (String, bool) {
        let grounded = !context.trim().is_empty();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        let template = if grounded {
            vars.insert("context".to_string(), context.to_string());
            &self.prompts.answer.grounded
        } else {
            &self.prompts.answer.ungrounded
        };

        (self.prompts.render_with_custom(template, &vars), grounded)
    }

    /// Ask the model. The completion is returned as produced, except that a blank one is
    /// a `Generation` error.
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    pub async fn generate(&self, context: &str, question: &str) -> Result<Answer> {
        let (prompt, grounded) = self.build_prompt(context, question);
        debug!(grounded, "Sending prompt to {}", self.model.model_name());

        let text = self.model.complete(&prompt).await?;
        if text.trim().is_empty() {
            return Err(DocQaError::Generation("Model returned an empty answer".to_string()));
        }

        Ok(Answer {
            text,
            grounded,
            sources: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records prompts and replies with a fixed string.
    struct Recorder {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for Recorder {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    fn recorder(reply: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_grounded_prompt_contains_context_and_question() {
        let model = recorder("  It boils at 100C.\n");
        let generator = AnswerGenerator::new(model.clone());

        let answer = generator
            .generate("Water boils at 100C.", "When does water boil?")
            .await
            .unwrap();

        assert!(answer.grounded);
        assert_eq!(answer.text, "  It boils at 100C.\n");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Based on the following excerpts from a document:\n\nWater boils at 100C."));
        assert!(prompts[0].contains("Please answer this question: When does water boil?"));
    }

    #[tokio::test]
    async fn test_blank_context_is_ungrounded() {
        let model = recorder("Paris.");
        let generator = AnswerGenerator::new(model.clone());

        let answer = generator.generate(" \n ", "Capital of France?").await.unwrap();
        assert!(!answer.grounded);
        assert!(!model.prompts.lock().unwrap()[0].contains("excerpts"));
    }

    #[test]
    fn test_context_placeholders_are_not_expanded() {
        let generator = AnswerGenerator::new(recorder("ok"));
        let (prompt, _) = generator.build_prompt("see {{question}}", "real question");
        assert!(prompt.contains("see {{question}}"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_generation_error() {
        let generator = AnswerGenerator::new(recorder("   "));
        let err = generator.generate("ctx", "q").await.unwrap_err();
        assert!(matches!(err, DocQaError::Generation(_)));
    }
}
