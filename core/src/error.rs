use crate::DocId;
use thiserror::Error;

/// Failures of the text normalization collaborator.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("normalization failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    /// A document id that `add` never handed out was passed to the postings store.
    #[error("document {doc_id} out of range (next document id is {next_doc_id})")]
    DocumentOutOfRange { doc_id: DocId, next_doc_id: DocId },
    #[error("document id space exhausted")]
    DocIdSpaceExhausted,
    #[error("invalid input {path}: {reason}")]
    InvalidInput { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
