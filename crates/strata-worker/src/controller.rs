//! Business controller trait and registry

use crate::error::Result;
use crate::request::Request;
use crate::status::ProvisioningState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a successful controller run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerResult {
    /// Terminal provisioning state to record for the operation
    pub state: ProvisioningState,
}

impl Default for ControllerResult {
    fn default() -> Self {
        Self {
            state: ProvisioningState::Succeeded,
        }
    }
}

/// One business operation (e.g. create-or-update a resource).
///
/// `run` executes under the operation's timeout: when the deadline elapses
/// the future is dropped, so implementations must not hold work that needs
/// to outlive cancellation, and must leave the store no more inconsistent
/// than the deployment processor's partial-delete policy already tolerates.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn run(&self, request: &Request) -> Result<ControllerResult>;
}

/// Maps an operation type (its `RESOURCETYPE|VERB` string form) to the
/// controller that executes it. Built at startup, read-only afterwards.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        operation_type: impl Into<String>,
        controller: Arc<dyn Controller>,
    ) -> Self {
        self.controllers
            .insert(operation_type.into().to_ascii_uppercase(), controller);
        self
    }

    pub fn get(&self, operation_type: &str) -> Option<Arc<dyn Controller>> {
        self.controllers
            .get(&operation_type.to_ascii_uppercase())
            .cloned()
    }
}
