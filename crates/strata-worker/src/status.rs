//! Provisioning state and the persisted operation status record

use crate::request::{OperationType, Request};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a resource's last-known operation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Accepted,
    Updating,
    Succeeded,
    Failed,
    Canceled,
}

impl ProvisioningState {
    /// Whether the state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::Canceled
        )
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProvisioningState::Accepted => "Accepted",
            ProvisioningState::Updating => "Updating",
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Failed => "Failed",
            ProvisioningState::Canceled => "Canceled",
        };
        f.write_str(s)
    }
}

/// Error codes carried in persisted operation status
pub mod codes {
    pub const INTERNAL: &str = "Internal";
    pub const INVALID_OPERATION_TYPE: &str = "InvalidOperationType";
    pub const INVALID_RESOURCE_TYPE: &str = "InvalidResourceType";
    pub const MALFORMED_ID: &str = "MalformedId";
    pub const NOT_FOUND: &str = "NotFound";
    pub const OPERATION_CANCELED: &str = "OperationCanceled";
    pub const PRECONDITION_FAILED: &str = "PreconditionFailed";
}

/// Structured error persisted with a terminal Failed/Canceled status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

/// The per-operation status record.
///
/// One store entry per operation id, independent of the resource's own
/// record; clients poll this record for the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOperationStatus {
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    pub resource_id: String,
    pub status: ProvisioningState,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl AsyncOperationStatus {
    /// Fresh in-flight status for a request, marked Updating.
    pub fn updating(request: &Request) -> Self {
        Self {
            operation_id: request.operation_id,
            operation_type: request.operation_type.clone(),
            resource_id: request.resource_id.clone(),
            status: ProvisioningState::Updating,
            start_time: Utc::now(),
            end_time: None,
            error: None,
            correlation_id: request.correlation_id.clone(),
        }
    }

    /// Transition to a terminal state, recording the end time.
    pub fn complete(&mut self, state: ProvisioningState, error: Option<ErrorDetails>) {
        self.status = state;
        self.end_time = Some(Utc::now());
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ProvisioningState::Accepted.is_terminal());
        assert!(!ProvisioningState::Updating.is_terminal());
        assert!(ProvisioningState::Succeeded.is_terminal());
        assert!(ProvisioningState::Failed.is_terminal());
        assert!(ProvisioningState::Canceled.is_terminal());
    }

    #[test]
    fn test_provisioning_state_serializes_as_pascal_case() {
        let json = serde_json::to_string(&ProvisioningState::Succeeded).unwrap();
        assert_eq!(json, "\"Succeeded\"");
    }
}
