//! Error types for weft operations.

use thiserror::Error;

/// Errors that can occur while reading or converting a document.
///
/// Recoverable problems (unknown styles, malformed tables, unreadable
/// images) never surface here; they are reported as [`crate::Diagnostic`]
/// values alongside the conversion output.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid document: {0}")]
    InvalidDocx(String),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("error reading image: {0}")]
    Image(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
