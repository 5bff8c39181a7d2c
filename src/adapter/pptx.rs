//! PowerPoint adapter: one segment per slide.

use super::ooxml::{open_package, paragraphs, read_part};
use super::FormatAdapter;
use crate::document::{DocumentFormat, Segment};
use crate::error::Result;
use regex::Regex;
use std::sync::LazyLock;

static SLIDE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Adapter for `.pptx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxAdapter;

impl FormatAdapter for PptxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pptx
    }

    fn extensions(&self) -> &[&str] {
        &["pptx"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>> {
        let mut package = open_package(bytes)?;

        // Archive order is arbitrary; slide2 must come before slide10
        let mut slides: Vec<(u32, String)> = package
            .file_names()
            .filter_map(|name| {
                let number: u32 = SLIDE_PART.captures(name)?[1].parse().ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        slides.sort_by_key(|(number, _)| *number);

        let mut segments = Vec::with_capacity(slides.len());
        for (_, name) in slides {
            let xml = read_part(&mut package, &name)?;
            let text = paragraphs(&xml)?
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            segments.push(Segment::plain(text));
        }

        Ok(segments)
    }
}
