//! # weft
//!
//! A lightweight library for converting DOCX documents to clean HTML or
//! Markdown, driven by a small style-mapping language.
//!
//! ## Features
//!
//! - Style mappings like `p[style-name='Heading 1'] => h1:fresh` decide
//!   how document styles become markup, with sensible defaults built in
//! - Footnotes, endnotes, comments, bookmarks, hyperlinks (including
//!   field-code hyperlinks), tables with merged cells, and inline images
//! - Fail-soft conversion: problems are reported as diagnostics alongside
//!   the output instead of aborting
//!
//! ## Quick Start
//!
//! ```no_run
//! use weft::{convert_to_html, ConversionOptions};
//!
//! let result = convert_to_html("report.docx", &ConversionOptions::default()).unwrap();
//! println!("{}", result.value);
//! for message in &result.messages {
//!     eprintln!("{message}");
//! }
//! ```
//!
//! ## Style maps
//!
//! A style map is an ordered list of rules; the first match wins:
//!
//! ```no_run
//! use weft::{convert_to_html, ConversionOptions};
//!
//! let options = ConversionOptions {
//!     style_map: "p[style-name='Warning'] => div.warning > p:fresh".to_string(),
//!     ..ConversionOptions::default()
//! };
//! let result = convert_to_html("report.docx", &options).unwrap();
//! # let _ = result;
//! ```

pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod docx;
pub mod error;
pub mod html;
pub mod stylemap;
pub mod write;

pub use convert::{ConversionOptions, ConversionResult, convert_document};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use docx::{read_document, read_document_path};
pub use error::{Error, Result};
pub use stylemap::{StyleMap, StyleRule};

use std::io::{Read, Seek};
use std::path::Path;

/// Convert a DOCX file on disk to an HTML fragment.
pub fn convert_to_html(
    path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<ConversionResult> {
    let (document, diagnostics) = docx::read_document_path(path)?;
    Ok(render(&document, diagnostics, options, write::write_html))
}

/// Convert a DOCX document from any seekable byte source to HTML.
pub fn convert_to_html_from_reader<R: Read + Seek>(
    reader: R,
    options: &ConversionOptions,
) -> Result<ConversionResult> {
    let (document, diagnostics) = docx::read_document(reader)?;
    Ok(render(&document, diagnostics, options, write::write_html))
}

/// Convert a DOCX file on disk to Markdown.
pub fn convert_to_markdown(
    path: impl AsRef<Path>,
    options: &ConversionOptions,
) -> Result<ConversionResult> {
    let (document, diagnostics) = docx::read_document_path(path)?;
    Ok(render(&document, diagnostics, options, write::write_markdown))
}

/// Convert a DOCX document from any seekable byte source to Markdown.
pub fn convert_to_markdown_from_reader<R: Read + Seek>(
    reader: R,
    options: &ConversionOptions,
) -> Result<ConversionResult> {
    let (document, diagnostics) = docx::read_document(reader)?;
    Ok(render(&document, diagnostics, options, write::write_markdown))
}

fn render(
    document: &document::Document,
    mut diagnostics: Diagnostics,
    options: &ConversionOptions,
    writer: fn(&[html::HtmlNode]) -> String,
) -> ConversionResult {
    let (nodes, conversion_diagnostics) = convert_document(document, options);
    diagnostics.extend(conversion_diagnostics);
    ConversionResult {
        value: writer(&nodes),
        messages: diagnostics.into_vec(),
    }
}
