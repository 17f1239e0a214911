//! Error types and handling for shell link encoding and decoding.

use std::fmt;

/// Custom error type for shell link operations
#[derive(Debug)]
pub enum Error {
    /// I/O related errors
    Io(std::io::Error),
    /// JSON serialization errors
    Json(serde_json::Error),
    /// CSV writing errors
    Csv(csv::Error),
    /// Bad magic, bad CLSID or a buffer shorter than the 76-byte header
    InvalidHeader(String),
    /// A section claims more bytes than the buffer holds
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// LinkInfo offsets or sizes outside the declared block
    MalformedLinkInfo(String),
    /// Extra-data block size inconsistency
    MalformedExtraData(String),
    /// Show command that cannot be written
    InvalidShowCommand(u32),
    /// String longer than its length field can encode
    PathTooLong { field: &'static str, length: usize },
    /// Invalid input format
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Csv(err) => write!(f, "CSV error: {}", err),
            Error::InvalidHeader(msg) => write!(f, "Invalid shell link header: {}", msg),
            Error::TruncatedData { offset, needed, available } => write!(
                f,
                "Truncated data at offset {}: need {} bytes, {} available",
                offset, needed, available
            ),
            Error::MalformedLinkInfo(msg) => write!(f, "Malformed LinkInfo: {}", msg),
            Error::MalformedExtraData(msg) => write!(f, "Malformed extra data: {}", msg),
            Error::InvalidShowCommand(value) => write!(f, "Invalid show command: {}", value),
            Error::PathTooLong { field, length } => {
                write!(f, "{} too long to encode: {} units", field, length)
            }
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Csv(err) => Some(err),
            _ => None,
        }
    }
}

// Convenient conversion traits
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;
