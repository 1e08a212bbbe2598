//! Deployment processor error types

use crate::resource::ResourceIdentity;
use thiserror::Error;

/// Deployment processor errors
#[derive(Error, Debug)]
pub enum DeployError {
    /// No renderer is registered for the resource's type. Permanent: retrying
    /// the operation cannot succeed until a renderer is registered.
    #[error("invalid resource type: {resource_type:?} for dependent resource ID: {resource_id:?}")]
    UnsupportedResourceType {
        resource_type: String,
        resource_id: String,
    },

    /// No handler is registered for an output resource kind. Permanent.
    #[error("no resource handler registered for kind: {0}")]
    UnsupportedHandlerKind(String),

    #[error("duplicate output resource local id: {0}")]
    DuplicateLocalId(String),

    #[error("output resource {local_id:?} declares unknown dependency {dependency:?}")]
    UnknownDependency {
        local_id: String,
        dependency: String,
    },

    /// The renderer produced a dependency graph that is not a DAG. Permanent;
    /// this is a renderer bug and is surfaced, not hidden.
    #[error("dependency cycle among output resources: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// A handler Put failed. `applied` lists the identities that were already
    /// applied before the failure, in apply order; the caller decides whether
    /// to roll those back.
    #[error("failed to put output resource {local_id:?}: {message}")]
    PutFailed {
        local_id: String,
        message: String,
        applied: Vec<ResourceIdentity>,
    },

    /// One or more handler Deletes failed. Deletion is best-effort: every
    /// resource is attempted and the failures are reported together.
    #[error("failed to delete {} output resource(s): {}", .failures.len(), format_failures(.failures))]
    DeleteFailed { failures: Vec<DeleteFailure> },

    #[error("computed value {name:?} could not be resolved from output resource {local_id:?}")]
    UnresolvedComputedValue { name: String, local_id: String },

    /// Opaque platform error raised by a handler implementation.
    #[error("platform error: {0}")]
    Platform(String),
}

/// One failed deletion within a Delete pass
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    /// Local id of the output resource whose deletion failed
    pub local_id: String,

    /// Handler error message
    pub message: String,
}

fn format_failures(failures: &[DeleteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.local_id, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, DeployError>;
