//! Worker error types

use crate::status::{codes, ErrorDetails};
use std::time::Duration;
use strata_deploy::DeployError;
use strata_resources::ResourceIdError;
use strata_store::StoreError;
use thiserror::Error;

/// Errors produced while processing an async operation
#[derive(Error, Debug)]
pub enum WorkerError {
    /// No business controller is registered for the operation type. Fatal,
    /// never retried.
    #[error("no controller registered for operation type: {0}")]
    UnknownOperationType(String),

    #[error("'{0}' is not a valid operation type")]
    MalformedOperationType(String),

    /// The operation exceeded its timeout budget.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    ResourceId(#[from] ResourceIdError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

impl WorkerError {
    /// Structured error persisted into the operation's terminal status.
    pub fn to_details(&self) -> ErrorDetails {
        let code = match self {
            WorkerError::UnknownOperationType(_) | WorkerError::MalformedOperationType(_) => {
                codes::INVALID_OPERATION_TYPE
            }
            WorkerError::Timeout(_) => codes::OPERATION_CANCELED,
            WorkerError::ResourceId(_) => codes::MALFORMED_ID,
            WorkerError::Store(StoreError::NotFound(_)) => codes::NOT_FOUND,
            WorkerError::Store(StoreError::ETagMismatch(_)) => codes::PRECONDITION_FAILED,
            WorkerError::Store(_) => codes::INTERNAL,
            WorkerError::Deploy(
                DeployError::UnsupportedResourceType { .. }
                | DeployError::UnsupportedHandlerKind(_),
            ) => codes::INVALID_RESOURCE_TYPE,
            WorkerError::Deploy(_) => codes::INTERNAL,
        };
        ErrorDetails {
            code: code.to_string(),
            message: self.to_string(),
        }
    }
}
