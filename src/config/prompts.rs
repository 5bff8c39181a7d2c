//! Prompt templates for docqa.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    /// Used when retrieved context is available. Placeholders: `{{context}}`, `{{question}}`.
    pub grounded: String,
    /// Used when no document context exists. Placeholder: `{{question}}`.
    pub ungrounded: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            grounded: r#"Based on the following excerpts from a document:

{{context}}

Please answer this question: {{question}}

Make use of the section information and page numbers in your answer when relevant.
"#
            .to_string(),

            ungrounded: r#"Please answer this question: {{question}}
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// The template is scanned once, left to right. Substituted values are never
    /// re-scanned, and unknown placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];

            let Some(end) = after_open.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };

            let name = &after_open[..end];
            match vars.get(name.trim()) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(name);
                    result.push_str("}}");
                }
            }
            rest = &after_open[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.answer.grounded.contains("{{context}}"));
        assert!(prompts.answer.grounded.contains("{{question}}"));
        assert!(!prompts.answer.ungrounded.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let result = Prompts::render(template, &vars(&[("name", "Alice"), ("count", "5")]));
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let template = "{{context}}\nQ: {{question}}";
        let result = Prompts::render(
            template,
            &vars(&[("context", "literal {{question}} here"), ("question", "why?")]),
        );
        assert_eq!(result, "literal {{question}} here\nQ: why?");
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_stay_verbatim() {
        let result = Prompts::render("{{missing}} and {{open", &vars(&[]));
        assert_eq!(result, "{{missing}} and {{open");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_vars() {
        let mut prompts = Prompts::default();
        prompts.variables = vars(&[("team", "Ops"), ("question", "config")]);

        let result = prompts.render_with_custom("{{team}}: {{question}}", &vars(&[("question", "call")]));
        assert_eq!(result, "Ops: call");
    }

    #[test]
    fn test_load_custom_answer_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "grounded = \"CTX {{context}} Q {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.answer.grounded, "CTX {{context}} Q {{question}}");
        // Missing keys fall back to the defaults
        assert_eq!(prompts.answer.ungrounded, AnswerPrompts::default().ungrounded);
    }
}
