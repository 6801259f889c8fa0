//! Error types for xlpack

use std::io;

/// Result type for xlpack operations
pub type Result<T> = std::result::Result<T, XlPackError>;

/// Error types that can occur while assembling a package
#[derive(Debug)]
pub enum XlPackError {
    /// I/O error from the destination sink or a media file read
    Io(io::Error),
    /// A media item carries none of: file path, byte buffer, base64 string
    UnsupportedMedia(String),
    /// A content-type override was registered twice for the same part
    DuplicatePart(String),
    /// Archive encoding failed (compression, base64 decode, size overflow)
    Encoding(String),
}

impl std::fmt::Display for XlPackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlPackError::Io(e) => write!(f, "I/O error: {}", e),
            XlPackError::UnsupportedMedia(name) => {
                write!(f, "Unsupported media: {}", name)
            }
            XlPackError::DuplicatePart(part) => {
                write!(f, "Duplicate content-type override for part: {}", part)
            }
            XlPackError::Encoding(msg) => write!(f, "Archive encoding error: {}", msg),
        }
    }
}

impl std::error::Error for XlPackError {}

impl From<io::Error> for XlPackError {
    fn from(err: io::Error) -> Self {
        XlPackError::Io(err)
    }
}
