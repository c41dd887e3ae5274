//! Alert log input
//!
//! Turns lines of an alert log into [`AlertRecord`](crate::models::AlertRecord)s.

pub mod extractor;
pub mod ipv4;

pub use extractor::{AlertRecords, FieldExtractor, ParseReport};
pub use ipv4::{int_to_ip, ip_to_int};

use thiserror::Error;

/// Errors that can occur while extracting a record from a line
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Line does not match the alert pattern: {0:?}")]
    MalformedLine(String),

    #[error("Required field missing: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid IPv4 address: {0}")]
    InvalidOctet(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Invalid timestamp '{fragment}': {source}")]
    InvalidTimestamp {
        fragment: String,
        source: chrono::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid alert pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// An extraction error tied to the line it happened on
#[derive(Error, Debug)]
#[error("line {line_number}: {kind}")]
pub struct LineError {
    /// 1-based line number in the input
    pub line_number: usize,
    #[source]
    pub kind: ExtractError,
}

impl LineError {
    pub fn new(line_number: usize, kind: ExtractError) -> Self {
        LineError { line_number, kind }
    }

    /// Whether the input itself could not be read, as opposed to one bad line
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ExtractError::Io(_))
    }
}
