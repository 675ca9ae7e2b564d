//! Error types for the conversion library.

use std::io;
use thiserror::Error;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting between formats.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable DOCX package.
    #[error("Invalid DOCX file: {0}")]
    InvalidDocx(String),

    /// An XML part could not be parsed into a document tree.
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// An XML file could not be read as an event stream.
    #[error("XML stream error: {0}")]
    XmlStream(#[from] quick_xml::Error),

    /// A JSON input could not be parsed.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input document does not have the structure the conversion needs.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
