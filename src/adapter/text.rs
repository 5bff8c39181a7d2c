//! Plain-text adapter: one segment per non-blank line.

use super::FormatAdapter;
use crate::document::{DocumentFormat, Segment};
use crate::error::{DocQaError, Result};

/// Adapter for `.txt` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAdapter;

impl FormatAdapter for TextAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn extensions(&self) -> &[&str] {
        &["txt"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DocQaError::Parse(format!("Text file is not valid UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Segment::plain)
            .collect())
    }
}
