//! Heading- and token-aware chunk packing.

use super::layout::{parse_elements, ElementKind};
use super::{count_tokens, ChunkingConfig, PageText};
use crate::document::Segment;
use tracing::debug;

/// Packs layout elements into bounded chunks carrying heading breadcrumbs and pages.
pub struct HybridChunker {
    config: ChunkingConfig,
}

/// A chunk under construction.
#[derive(Debug, Clone)]
struct Draft {
    parts: Vec<String>,
    tokens: usize,
    page: Option<u32>,
    headings: Vec<String>,
    label: Option<&'static str>,
}

impl Draft {
    fn new(page: Option<u32>, headings: Vec<String>) -> Self {
        Self {
            parts: Vec::new(),
            tokens: 0,
            page,
            headings,
            label: None,
        }
    }

    fn push(&mut self, text: String, tokens: usize, label: &'static str) {
        self.parts.push(text);
        self.tokens += tokens;
        self.label = Some(label);
    }

    fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn into_segment(self) -> Segment {
        Segment {
            text: self.parts.join("\n"),
            headings: (!self.headings.is_empty()).then_some(self.headings),
            page: self.page,
            label: self.label.map(str::to_string),
        }
    }
}

impl HybridChunker {
    /// Create a new chunker.
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    fn max_tokens(&self) -> usize {
        self.config.max_tokens.max(1)
    }

    /// Chunk a sequence of pages into segments.
    pub fn chunk(&self, pages: &[PageText]) -> Vec<Segment> {
        let max_tokens = self.max_tokens();
        let mut breadcrumbs: Vec<(usize, String)> = Vec::new();
        let mut drafts: Vec<Draft> = Vec::new();
        // A heading not yet followed by any body text
        let mut orphan: Option<Draft> = None;

        for page in pages {
            let mut pending = Draft::new(page.number, titles(&breadcrumbs));

            for element in parse_elements(&page.text) {
                match element.kind {
                    ElementKind::Heading { level } => {
                        flush(&mut pending, &mut drafts);
                        if let Some(heading_only) = orphan.take() {
                            drafts.push(heading_only);
                        }

                        while breadcrumbs.last().is_some_and(|(l, _)| *l >= level) {
                            breadcrumbs.pop();
                        }

                        let mut heading_only = Draft::new(page.number, titles(&breadcrumbs));
                        let tokens = count_tokens(&element.text);
                        heading_only.push(element.text.clone(), tokens, element.kind.label());
                        orphan = Some(heading_only);

                        breadcrumbs.push((level, element.text));
                        pending = Draft::new(page.number, titles(&breadcrumbs));
                    }
                    kind => {
                        orphan = None;
                        for piece in self.split_oversized(&element.text, kind) {
                            let tokens = count_tokens(&piece);
                            if !pending.is_empty() && pending.tokens + tokens > max_tokens {
                                flush(&mut pending, &mut drafts);
                            }
                            pending.push(piece, tokens, kind.label());
                        }
                    }
                }
            }

            flush(&mut pending, &mut drafts);
        }

        if let Some(heading_only) = orphan {
            drafts.push(heading_only);
        }

        if self.config.merge_peers {
            drafts = self.merge_peers(drafts);
        }

        debug!("Packed {} pages into {} chunks", pages.len(), drafts.len());
        drafts.into_iter().map(Draft::into_segment).collect()
    }

    /// Split an element that exceeds the token limit.
    ///
    /// Tables split between rows; prose splits between sentences, then between words.
    fn split_oversized(&self, text: &str, kind: ElementKind) -> Vec<String> {
        let max_tokens = self.max_tokens();
        if count_tokens(text) <= max_tokens {
            return vec![text.to_string()];
        }

        if kind == ElementKind::Table {
            let rows = text.lines().map(|row| row.split_whitespace().collect());
            return pack_units(rows, max_tokens, "\n");
        }

        pack_units(sentences(text).into_iter(), max_tokens, " ")
    }

    /// Merge undersized neighbours that share a heading breadcrumb.
    fn merge_peers(&self, drafts: Vec<Draft>) -> Vec<Draft> {
        let max_tokens = self.max_tokens();
        let mut merged: Vec<Draft> = Vec::with_capacity(drafts.len());

        for draft in drafts {
            match merged.last_mut() {
                Some(last)
                    if last.tokens < self.config.min_tokens
                        && last.headings == draft.headings
                        && last.tokens + draft.tokens <= max_tokens =>
                {
                    last.parts.extend(draft.parts);
                    last.tokens += draft.tokens;
                    // Provenance of the merged chunk follows its last element
                    if draft.page.is_some() {
                        last.page = draft.page;
                    }
                    if draft.label.is_some() {
                        last.label = draft.label;
                    }
                }
                _ => merged.push(draft),
            }
        }

        merged
    }
}

fn flush(pending: &mut Draft, drafts: &mut Vec<Draft>) {
    if !pending.is_empty() {
        let fresh = Draft::new(pending.page, pending.headings.clone());
        drafts.push(std::mem::replace(pending, fresh));
    }
}

fn titles(breadcrumbs: &[(usize, String)]) -> Vec<String> {
    breadcrumbs.iter().map(|(_, title)| title.clone()).collect()
}

/// Split prose into sentences, each a list of words.
fn sentences(text: &str) -> Vec<Vec<&str>> {
    let mut result = Vec::new();
    let mut current = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(&['.', '!', '?'][..]) {
            result.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        result.push(current);
    }

    result
}

/// Greedily pack word units into pieces of at most `max_tokens` words.
fn pack_units<'a, I>(units: I, max_tokens: usize, separator: &str) -> Vec<String>
where
    I: Iterator<Item = Vec<&'a str>>,
{
    let mut pieces: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_tokens = 0;

    for unit in units {
        if unit.is_empty() {
            continue;
        }

        if unit.len() > max_tokens {
            if !current.is_empty() {
                pieces.push(current.join(separator));
                current.clear();
                current_tokens = 0;
            }
            for window in unit.chunks(max_tokens) {
                pieces.push(window.join(" "));
            }
            continue;
        }

        if current_tokens + unit.len() > max_tokens {
            pieces.push(current.join(separator));
            current.clear();
            current_tokens = 0;
        }

        current_tokens += unit.len();
        current.push(unit.join(" "));
    }

    if !current.is_empty() {
        pieces.push(current.join(separator));
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_tokens: usize, merge_peers: bool) -> HybridChunker {
        HybridChunker::new(ChunkingConfig {
            max_tokens,
            min_tokens: 4,
            merge_peers,
        })
    }

    #[test]
    fn test_headings_and_pages_propagate() {
        let pages = vec![
            PageText::new(1, "1 Scope\nThis procedure covers the pump room.\n\n1.1 Safety Gear\nWear gloves at all times."),
            PageText::new(2, "Keep the exit clear at all times.\n\n2 Records\nLog every reading daily."),
        ];
        let segments = chunker(100, false).chunk(&pages);

        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].headings, Some(vec!["1 Scope".to_string()]));
        assert_eq!(segments[0].page, Some(1));
        assert_eq!(
            segments[1].headings,
            Some(vec!["1 Scope".to_string(), "1.1 Safety Gear".to_string()])
        );
        // Breadcrumb continues onto the next page
        assert_eq!(segments[2].headings, segments[1].headings);
        assert_eq!(segments[2].page, Some(2));
        assert_eq!(segments[3].headings, Some(vec!["2 Records".to_string()]));
        assert_eq!(segments[3].label.as_deref(), Some("text"));
    }

    #[test]
    fn test_chunks_respect_token_limit() {
        let sentence = "The operator checks the gauge and records the value.";
        let body = vec![sentence; 20].join(" ");
        let pages = vec![PageText::new(1, body)];
        let segments = chunker(25, false).chunk(&pages);

        assert!(segments.len() > 1);
        for segment in &segments {
            assert!(count_tokens(&segment.text) <= 25);
            assert_eq!(segment.headings, None);
        }
    }

    #[test]
    fn test_oversized_sentence_splits_on_words() {
        let body = vec!["word"; 30].join(" ");
        let segments = chunker(10, false).chunk(&[PageText::new(1, body)]);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| count_tokens(&s.text) == 10));
    }

    #[test]
    fn test_merge_peers_joins_small_neighbours_across_pages() {
        let pages = vec![
            PageText::new(1, "OVERVIEW\nShort intro."),
            PageText::new(2, "More intro text here."),
        ];
        let segments = chunker(100, true).chunk(&pages);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Short intro.\nMore intro text here.");
        assert_eq!(segments[0].page, Some(2));

        let unmerged = chunker(100, false).chunk(&pages);
        assert_eq!(unmerged.len(), 2);
    }

    #[test]
    fn test_heading_without_body_becomes_chunk() {
        let segments = chunker(100, true).chunk(&[PageText::new(1, "ANNUAL REPORT")]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "ANNUAL REPORT");
        assert_eq!(segments[0].label.as_deref(), Some("section_header"));
        assert_eq!(segments[0].headings, None);
    }

    #[test]
    fn test_missing_page_number_is_tolerated() {
        let pages = vec![PageText {
            number: None,
            text: "Plain body text without structure.".to_string(),
        }];
        let segments = chunker(100, true).chunk(&pages);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].page, None);
    }
}
