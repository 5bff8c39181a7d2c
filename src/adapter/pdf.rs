//! PDF adapter.
//!
//! Uses lopdf to extract text page by page, then the hybrid chunker to produce
//! heading-aware, token-bounded segments that remember their page.

use super::FormatAdapter;
use crate::chunking::{ChunkingConfig, HybridChunker, PageText};
use crate::document::{DocumentFormat, Segment};
use crate::error::{DocQaError, Result};
use lopdf::Document;
use std::sync::Arc;
use tracing::{debug, warn};

/// Adapter for `.pdf` files.
#[derive(Clone)]
pub struct PdfAdapter {
    chunker: Arc<HybridChunker>,
}

impl PdfAdapter {
    /// Create a new PDF adapter with the given chunking configuration.
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            chunker: Arc::new(HybridChunker::new(config)),
        }
    }
}

impl Default for PdfAdapter {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl FormatAdapter for PdfAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>> {
        let pages = extract_pages(bytes)?;
        Ok(self.chunker.chunk(&pages))
    }
}

/// Extract the text of every page.
///
/// A page whose text cannot be decoded is skipped. The document fails when it cannot be
/// loaded or when no page carries a text layer; scanned pages are not OCR'd.
fn extract_pages(bytes: &[u8]) -> Result<Vec<PageText>> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DocQaError::Parse(format!("Failed to load PDF: {}", e)))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for number in &page_numbers {
        match doc.extract_text(&[*number]) {
            Ok(text) => pages.push(PageText::new(*number, text)),
            Err(e) => warn!("Failed to extract text from page {}: {}", number, e),
        }
    }

    if pages.is_empty() && !page_numbers.is_empty() {
        return Err(DocQaError::Parse(
            "No page of the PDF contains extractable text".to_string(),
        ));
    }

    if pages.iter().all(|page| page.text.trim().is_empty()) {
        return Err(DocQaError::Parse(
            "PDF has no extractable text layer (OCR not available)".to_string(),
        ));
    }

    debug!(
        "Extracted text from {} of {} PDF pages",
        pages.len(),
        page_numbers.len()
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a minimal PDF with one text line per entry on each page.
    fn pdf_bytes(pages: &[&[&str]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for lines in pages {
            // One text object per line so extraction yields one line each
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                let y = 700 - 16 * i as i64;
                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), y.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ]);
            }

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_pages_become_segments_with_page_numbers() {
        let bytes = pdf_bytes(&[
            &["Pump Maintenance", "Inspect the seals every week."],
            &["Replace worn gaskets before restarting."],
        ]);

        let segments = PdfAdapter::default().parse(&bytes).unwrap();
        assert!(!segments.is_empty());

        let all_text: String = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" ");
        assert!(all_text.contains("Inspect the seals every week."));
        assert!(segments.iter().all(|s| s.page.is_some()));
        assert!(segments.iter().any(|s| s.page == Some(2)));
    }

    #[test]
    fn test_pages_without_text_layer_are_parse_error() {
        let bytes = pdf_bytes(&[&[], &[]]);
        let err = PdfAdapter::default().parse(&bytes).unwrap_err();
        match err {
            DocQaError::Parse(msg) => assert!(msg.contains("extractable text")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfAdapter::default().parse(b"%PDF-1.4 not really").unwrap_err();
        assert!(matches!(err, DocQaError::Parse(_)));
    }
}
