//! Word document adapter: one segment per paragraph.

use super::ooxml::{open_package, paragraphs, read_part};
use super::FormatAdapter;
use crate::document::{DocumentFormat, Segment};
use crate::error::Result;

const DOCUMENT_PART: &str = "word/document.xml";

/// Adapter for `.docx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxAdapter;

impl FormatAdapter for DocxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>> {
        let mut package = open_package(bytes)?;
        let xml = read_part(&mut package, DOCUMENT_PART)?;

        // Empty paragraphs are kept so the chunk extractor can report them
        Ok(paragraphs(&xml)?.into_iter().map(Segment::plain).collect())
    }
}
