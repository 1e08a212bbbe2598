//! Store error types

use thiserror::Error;

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested id does not exist.
    #[error("the resource {0} was not found")]
    NotFound(String),

    /// A conditional Save or Delete presented a stale entity tag. Always
    /// recoverable: reload the object and retry with the fresh tag.
    #[error("etag mismatch for resource {0}: another writer updated it first")]
    ETagMismatch(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Whether this error is a Get/Delete miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
