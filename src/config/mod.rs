//! Configuration module for docqa.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts};
pub use settings::{
    EmbeddingProvider, EmbeddingSettings, GeneralSettings, IngestSettings, LlmSettings,
    PromptSettings, RetrievalSettings, Settings, VectorStoreSettings,
};
