//! HTML adapter: one segment per block of visible text.

use super::FormatAdapter;
use crate::document::{DocumentFormat, Segment};
use crate::error::Result;
use scraper::{ElementRef, Html, Node};

/// Adapter for `.html` / `.htm` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlAdapter;

impl FormatAdapter for HtmlAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Html
    }

    fn extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>> {
        let html = String::from_utf8_lossy(bytes);
        Ok(html_blocks(&html).into_iter().map(Segment::plain).collect())
    }
}

/// Parse the document and split its visible text into blocks at block-level elements.
///
/// Entities are decoded by the parser; attribute values and comments never reach the
/// text.
pub fn html_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut collector = BlockCollector::default();
    collector.walk(document.root_element());
    collector.finish()
}

#[derive(Default)]
struct BlockCollector {
    current: String,
    blocks: Vec<String>,
}

impl BlockCollector {
    fn walk(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        if is_hidden(tag) {
            return;
        }

        let block = is_block(tag);
        if block {
            self.flush();
        }

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.current.push_str(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk(child);
                    }
                }
                _ => {}
            }
        }

        if block {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let text = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        self.current.clear();
        if !text.is_empty() {
            self.blocks.push(text);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.blocks
    }
}

/// Elements whose content is never visible text.
fn is_hidden(tag: &str) -> bool {
    matches!(
        tag,
        "head" | "script" | "style" | "noscript" | "template" | "svg"
    )
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "br"
            | "hr"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dt"
            | "dd"
            | "tr"
            | "td"
            | "th"
            | "table"
            | "thead"
            | "tbody"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "nav"
            | "aside"
            | "main"
            | "blockquote"
            | "pre"
            | "figure"
            | "figcaption"
            | "form"
            | "title"
            | "body"
            | "html"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_blocks() {
        let html = r#"<!DOCTYPE html>
<html><head><title>Ignored</title><style>p { color: red; }</style></head>
<body>
  <!-- navigation -->
  <h1>Shift   Handover</h1>
  <p>Check the <b>boiler</b> pressure &amp; temperature.</p>
  <script>console.log("hidden");</script>
  <ul><li>Item one</li><li>Item two</li></ul>
</body></html>"#;

        let blocks = html_blocks(html);
        assert_eq!(
            blocks,
            vec![
                "Shift Handover",
                "Check the boiler pressure & temperature.",
                "Item one",
                "Item two",
            ]
        );
    }

    #[test]
    fn test_markup_characters_in_attributes_and_text() {
        let html = r#"<p data-rule="a > b">Visible text</p><p>Use x &lt; y</p>"#;
        assert_eq!(html_blocks(html), vec!["Visible text", "Use x < y"]);
    }

    #[test]
    fn test_comment_with_tag_is_not_text() {
        let html = "<p>Kept<!-- <p>dropped</p> --></p><div>Also kept</div>";
        assert_eq!(html_blocks(html), vec!["Kept", "Also kept"]);
    }

    #[test]
    fn test_adapter_tags_nothing() {
        let segments = HtmlAdapter.parse(b"<p>Hello</p>").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, None);
    }
}
