//! Layout analysis of extracted page text.
//!
//! Classifies lines into headings, list items, table rows and body text, then groups
//! them into elements.

use regex::Regex;
use std::sync::LazyLock;

const MAX_HEADING_CHARS: usize = 80;
const MAX_HEADING_WORDS: usize = 10;
const MIN_TABLE_CELLS: usize = 3;

static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+(\S.*)$").unwrap());

static ENUMERATED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,3}|[a-zA-Z]|[ivxIVX]{1,4})[.)]\s+\S").unwrap());

static CELL_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\t+|\s{2,}").unwrap());

const BULLETS: &[char] = &['•', '-', '*', '–', '—', '▪', '◦', '·', '‣', '○', '■'];

/// Kind of a layout element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Section heading with nesting level (1 = outermost).
    Heading { level: usize },
    Paragraph,
    ListItem,
    Table,
}

impl ElementKind {
    /// Structural label recorded as a chunk's content type.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Heading { .. } => "section_header",
            ElementKind::Paragraph => "text",
            ElementKind::ListItem => "list_item",
            ElementKind::Table => "table",
        }
    }
}

/// A contiguous block of page text with a single layout role.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
}

impl Element {
    fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Parse page text into ordered layout elements.
pub fn parse_elements(text: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut current: Option<Element> = None;

    for raw in text.lines() {
        let line = raw.trim();

        if line.is_empty() {
            flush(&mut current, &mut elements);
            continue;
        }

        if let Some(cells) = table_cells(line) {
            let row = cells.join(" | ");
            match current.as_mut() {
                Some(el) if el.kind == ElementKind::Table => {
                    el.text.push('\n');
                    el.text.push_str(&row);
                }
                _ => {
                    flush(&mut current, &mut elements);
                    current = Some(Element::new(ElementKind::Table, row));
                }
            }
            continue;
        }

        if let Some(level) = heading_level(line) {
            flush(&mut current, &mut elements);
            elements.push(Element::new(ElementKind::Heading { level }, line));
            continue;
        }

        if is_list_item(line) {
            flush(&mut current, &mut elements);
            current = Some(Element::new(ElementKind::ListItem, line));
            continue;
        }

        match current.as_mut() {
            // Wrapped lines continue the open paragraph or list item
            Some(el) if matches!(el.kind, ElementKind::Paragraph | ElementKind::ListItem) => {
                el.text.push(' ');
                el.text.push_str(line);
            }
            _ => {
                flush(&mut current, &mut elements);
                current = Some(Element::new(ElementKind::Paragraph, line));
            }
        }
    }

    flush(&mut current, &mut elements);
    elements
}

fn flush(current: &mut Option<Element>, elements: &mut Vec<Element>) {
    if let Some(el) = current.take() {
        elements.push(el);
    }
}

/// Determine whether a line is a heading, and at which level.
fn heading_level(line: &str) -> Option<usize> {
    let char_count = line.chars().count();
    if !(2..=MAX_HEADING_CHARS).contains(&char_count) {
        return None;
    }
    if line.ends_with(&['.', ',', ';', ':', '?', '!'][..]) {
        return None;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() > MAX_HEADING_WORDS {
        return None;
    }

    if let Some(caps) = NUMBERED_HEADING.captures(line) {
        let depth = caps[1].split('.').filter(|p| !p.is_empty()).count();
        let rest: Vec<&str> = caps[2].split_whitespace().collect();
        // "1. Install the tool" reads as a list item, "2.1 Setup" as a heading
        return is_title_like(&rest).then_some(depth);
    }

    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()) {
        return Some(1);
    }

    if is_title_like(&words) {
        return Some(2);
    }

    None
}

/// Title-like: starts with a capital and every longer word is capitalized.
fn is_title_like(words: &[&str]) -> bool {
    let Some(first) = words.first() else {
        return false;
    };
    if !first.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    if BULLETS.iter().any(|b| first.starts_with(*b)) {
        return false;
    }

    words.iter().all(|word| {
        let letters = word.chars().filter(|c| c.is_alphabetic()).count();
        letters < 4 || word.chars().next().is_some_and(|c| !c.is_lowercase())
    })
}

fn is_list_item(line: &str) -> bool {
    let mut chars = line.chars();
    if let Some(first) = chars.next() {
        if BULLETS.contains(&first) && chars.next().is_some_and(char::is_whitespace) {
            return true;
        }
    }
    ENUMERATED_ITEM.is_match(line)
}

/// Split a line into table cells when it looks like a table row.
fn table_cells(line: &str) -> Option<Vec<&str>> {
    let cells: Vec<&str> = CELL_SEPARATOR
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();
    (cells.len() >= MIN_TABLE_CELLS).then_some(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels() {
        assert_eq!(heading_level("INTRODUCTION"), Some(1));
        assert_eq!(heading_level("2.1 Installation Steps"), Some(2));
        assert_eq!(heading_level("3 Results"), Some(1));
        assert_eq!(heading_level("Safety Requirements"), Some(2));
        assert_eq!(heading_level("Water boils at 100C."), None);
        assert_eq!(heading_level("the quick brown fox jumps"), None);
        assert_eq!(heading_level("1. Install the package"), None);
    }

    #[test]
    fn test_parse_elements_groups_lines() {
        let text = "OVERVIEW\nThis procedure describes\nthe daily checks.\n\n\
                    - Check the valve\n- Log the reading\n\n\
                    Item    Qty    Owner\nGloves    2    Ops\n";
        let elements = parse_elements(text);

        assert_eq!(elements.len(), 5);
        assert_eq!(elements[0].kind, ElementKind::Heading { level: 1 });
        assert_eq!(elements[1].kind, ElementKind::Paragraph);
        assert_eq!(elements[1].text, "This procedure describes the daily checks.");
        assert_eq!(elements[2].kind, ElementKind::ListItem);
        assert_eq!(elements[3].text, "- Log the reading");
        assert_eq!(elements[4].kind, ElementKind::Table);
        assert_eq!(elements[4].text, "Item | Qty | Owner\nGloves | 2 | Ops");
    }

    #[test]
    fn test_labels() {
        assert_eq!(ElementKind::Paragraph.label(), "text");
        assert_eq!(ElementKind::Table.label(), "table");
        assert_eq!(ElementKind::Heading { level: 3 }.label(), "section_header");
    }
}
