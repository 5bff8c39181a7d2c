//! Format adapters: turn a file on disk into an ordered list of segments.
//!
//! Each supported format has an adapter implementing [`FormatAdapter`]. Adapters are
//! looked up by file extension through the [`AdapterRegistry`].

mod docx;
mod html;
mod ooxml;
mod pdf;
mod pptx;
mod registry;
mod text;

pub use docx::DocxAdapter;
pub use html::{html_blocks, HtmlAdapter};
pub use pdf::PdfAdapter;
pub use pptx::PptxAdapter;
pub use registry::AdapterRegistry;
pub use text::TextAdapter;

use crate::document::{DocumentFormat, Segment};
use crate::error::Result;

/// Trait for format-specific document adapters.
///
/// Adapters are pure parsers over the file bytes; reading the file and moving the
/// work onto the blocking pool is handled by [`AdapterRegistry::load`].
pub trait FormatAdapter: Send + Sync {
    /// The format this adapter handles.
    fn format(&self) -> DocumentFormat;

    /// Lower-case file extensions this adapter accepts.
    fn extensions(&self) -> &[&str];

    /// Parse raw file contents into ordered segments.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Segment>>;
}
