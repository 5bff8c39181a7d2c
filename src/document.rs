//! Document data model: formats, raw segments and normalized chunks.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
    Html,
    Text,
}

impl DocumentFormat {
    /// Fixed content-type tag used when a segment carries no structural label.
    pub fn tag(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Pptx => "PPTX",
            DocumentFormat::Html => "HTML",
            DocumentFormat::Text => "TXT",
        }
    }

    /// Lower-cased file extension of a path, if it has one.
    pub fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A raw unit of text produced by a format adapter.
///
/// Structural hints are optional; adapters that do not know them leave them `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segment {
    /// Extracted text (not yet trimmed).
    pub text: String,
    /// Heading breadcrumb, outermost first.
    pub headings: Option<Vec<String>>,
    /// 1-based page number the segment originates from.
    pub page: Option<u32>,
    /// Structural label such as `text`, `list_item` or `table`.
    pub label: Option<String>,
}

impl Segment {
    /// Create a plain segment with no structural hints.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A normalized chunk: the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Trimmed, non-empty text.
    pub text: String,
    /// Heading breadcrumb (possibly empty).
    pub headings: Vec<String>,
    /// Originating page, if known.
    pub page: Option<u32>,
    /// Content-type tag.
    pub content_type: Option<String>,
}

impl Chunk {
    /// Normalize a segment into a chunk.
    ///
    /// Returns `None` when the segment text is blank; such segments never reach the index.
    pub fn from_segment(segment: Segment, format: DocumentFormat) -> Option<Self> {
        let text = segment.text.trim();
        if text.is_empty() {
            return None;
        }

        let content_type = segment
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| format.tag().to_string());

        Some(Self {
            text: text.to_string(),
            headings: segment.headings.unwrap_or_default(),
            page: segment.page,
            content_type: Some(content_type),
        })
    }
}

/// Result of normalizing a batch of segments.
#[derive(Debug, Default)]
pub struct ExtractedChunks {
    /// Chunks in segment order.
    pub chunks: Vec<Chunk>,
    /// Number of blank segments that were dropped.
    pub skipped: usize,
}

/// Normalize an ordered list of segments, dropping blank ones.
pub fn extract_chunks(segments: Vec<Segment>, format: DocumentFormat) -> ExtractedChunks {
    let mut extracted = ExtractedChunks::default();

    for (index, segment) in segments.into_iter().enumerate() {
        match Chunk::from_segment(segment, format) {
            Some(chunk) => extracted.chunks.push(chunk),
            None => {
                tracing::debug!("Skipping empty segment at index {}", index);
                extracted.skipped += 1;
            }
        }
    }

    extracted
}
