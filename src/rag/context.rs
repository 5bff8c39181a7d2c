//! Context formatting for answer prompts and terminal display.

use super::RetrievedChunk;
use crate::document::Chunk;

/// Width of the separator line written after each chunk.
pub const SEPARATOR_WIDTH: usize = 40;

/// Serialize ranked chunks into the context block of an answer prompt.
///
/// Each chunk contributes an optional `Section: a > b` line, an optional `Page N:`
/// line, its text and a separator line, in input order.
pub fn format_context(chunks: &[Chunk]) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut parts = Vec::with_capacity(chunks.len() * 4);

    for chunk in chunks {
        if !chunk.headings.is_empty() {
            parts.push(format!("Section: {}", chunk.headings.join(" > ")));
        }
        if let Some(page) = chunk.page {
            parts.push(format!("Page {}:", page));
        }
        parts.push(chunk.text.clone());
        parts.push(separator.clone());
    }

    parts.join("\n")
}

/// Format retrieved chunks as a source listing for the user.
pub fn format_sources_for_display(sources: &[RetrievedChunk]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let mut location = Vec::new();
            if !source.chunk.headings.is_empty() {
                location.push(source.chunk.headings.join(" > "));
            }
            if let Some(page) = source.chunk.page {
                location.push(format!("page {}", page));
            }
            let location = if location.is_empty() {
                String::new()
            } else {
                format!(" [{}]", location.join(", "))
            };

            format!(
                "{}. (score: {:.2}){}\n   {}",
                i + 1,
                source.score,
                location,
                preview(&source.chunk.text, 160)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First `max_chars` characters of `text` on a single line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
