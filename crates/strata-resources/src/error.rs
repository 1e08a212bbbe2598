//! Resource identifier error types

use thiserror::Error;

/// Errors produced while parsing a resource identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceIdError {
    #[error("'{0}' is not a valid resource id")]
    MalformedId(String),

    #[error("'{id}' is not a valid resource id: {reason}")]
    InvalidSegment { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ResourceIdError>;
