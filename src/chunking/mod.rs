//! Structure-aware chunking for paginated documents.
//!
//! Page text is first parsed into layout elements (headings, paragraphs, list items,
//! table blocks), then packed into token-bounded chunks that remember their heading
//! breadcrumb and originating page.

mod hybrid;
mod layout;

pub use hybrid::HybridChunker;
pub use layout::{parse_elements, Element, ElementKind};

use serde::{Deserialize, Serialize};

/// Text of a single page, as produced by a paginated backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number, if the backend reports one.
    pub number: Option<u32>,
    /// Raw page text with line breaks preserved.
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number: Some(number),
            text: text.into(),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in whitespace-delimited tokens.
    pub max_tokens: usize,
    /// Chunks smaller than this are candidates for merging with their successor.
    pub min_tokens: usize,
    /// Merge undersized neighbouring chunks that share a heading breadcrumb.
    pub merge_peers: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            min_tokens: 64,
            merge_peers: true,
        }
    }
}

/// Approximate token count used for chunk sizing.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}
