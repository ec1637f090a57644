use crate::source::DocumentId;
use thiserror::Error;

/// Result type for document access
pub type Result<T> = std::result::Result<T, BufferError>;

/// Errors raised while reading from a document
#[derive(Error, Debug)]
pub enum BufferError {
    /// The host closed the document while a query was running
    #[error("Document {0} is closed")]
    Closed(DocumentId),

    /// A position outside the document was requested
    #[error("Position {position} is outside document {id} (length {len})")]
    InvalidPosition {
        id: DocumentId,
        position: usize,
        len: usize,
    },

    /// A search pattern could not be compiled
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error while loading a document
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
