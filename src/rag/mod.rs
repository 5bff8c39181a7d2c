//! RAG (Retrieval-Augmented Generation) for question answering over a document.
//!
//! Retrieval, context formatting and answer generation are separate pieces so the
//! engine can skip retrieval when nothing is indexed.

pub mod context;
mod generator;
mod model;
mod retriever;

pub use context::{format_context, format_sources_for_display};
pub use generator::AnswerGenerator;
pub use model::{LanguageModel, OpenAIChatModel};
pub use retriever::Retriever;

use crate::document::Chunk;
use serde::Serialize;

/// A chunk returned by retrieval, with its id and similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub chunk: Chunk,
    pub score: f32,
}

/// A generated answer.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Model output, unmodified.
    pub text: String,
    /// Whether document context was supplied to the model.
    pub grounded: bool,
    /// Chunks the context was built from, best first.
    pub sources: Vec<RetrievedChunk>,
}

impl Answer {
    /// Format the answer with its sources for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.trim_end().to_string();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n\n");
            output.push_str(&format_sources_for_display(&self.sources));
        }

        output
    }
}
