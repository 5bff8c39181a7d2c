//! Shared helpers for Office Open XML packages (DOCX, PPTX).

use crate::error::{DocQaError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open an OOXML package from memory.
pub(crate) fn open_package(bytes: &[u8]) -> Result<Package<'_>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocQaError::Parse(format!("Not a valid Office document archive: {}", e)))
}

/// Read a package part as UTF-8 text.
pub(crate) fn read_part(package: &mut Package<'_>, name: &str) -> Result<String> {
    let mut part = package
        .by_name(name)
        .map_err(|e| DocQaError::Parse(format!("Missing part {}: {}", name, e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| DocQaError::Parse(format!("Failed to read part {}: {}", name, e)))?;
    Ok(xml)
}

/// Collect the text of every `<*:p>` paragraph in document order.
///
/// Text comes from `<*:t>` runs; `<*:tab/>` and `<*:br/>` become a tab and a newline.
/// Paragraphs are returned untrimmed and may be empty.
pub(crate) fn paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    // Indices of the open paragraphs; text boxes nest a paragraph inside another
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => append(&mut paragraphs, &open, "\t"),
                b"br" | b"cr" => append(&mut paragraphs, &open, "\n"),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    open.pop();
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| DocQaError::Parse(format!("Bad XML text: {}", e)))?;
                append(&mut paragraphs, &open, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocQaError::Parse(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Append to the innermost open paragraph. Text outside a paragraph is dropped.
fn append(paragraphs: &mut [String], open: &[usize], text: &str) {
    if let Some(&index) = open.last() {
        paragraphs[index].push_str(text);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_box_paragraph_does_not_split_its_host() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body>
            <w:p><w:r><w:t>Before</w:t></w:r><w:r><w:pict><w:txbxContent>
                <w:p><w:r><w:t>Box</w:t></w:r></w:p>
            </w:txbxContent></w:pict></w:r><w:r><w:t xml:space="preserve"> After</w:t></w:r></w:p>
        </w:body></w:document>"#;

        assert_eq!(paragraphs(xml).unwrap(), vec!["Before After", "Box"]);
    }

    #[test]
    fn test_paragraphs_with_runs_tabs_and_entities() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body>
            <w:p><w:r><w:t>Fish</w:t></w:r><w:r><w:t xml:space="preserve"> &amp; chips</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let paras = paragraphs(xml).unwrap();
        assert_eq!(paras, vec!["Fish & chips", "", "A\tB"]);
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = paragraphs("<w:p><w:t>open</w:p>").unwrap_err();
        assert!(matches!(err, DocQaError::Parse(_)));
    }

    #[test]
    fn test_non_zip_is_parse_error() {
        assert!(matches!(
            open_package(b"definitely not a zip"),
            Err(DocQaError::Parse(_))
        ));
    }
}
