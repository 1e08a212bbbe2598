//! Persisted resource record

use crate::status::ProvisioningState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_deploy::{DeploymentOutput, OutputResource, SecretReference};
use strata_resources::ResourceId;

/// The data payload stored for one resource: definition properties plus the
/// last deployment outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Resource identifier string form
    pub id: String,

    /// Resource name (last id segment)
    pub name: String,

    /// Qualified resource type
    pub resource_type: String,

    /// Outcome of the last operation against this resource
    pub provisioning_state: ProvisioningState,

    /// Declarative desired-state properties
    #[serde(default)]
    pub properties: serde_json::Value,

    /// Output resources applied by the last successful deploy
    #[serde(default)]
    pub output_resources: Vec<OutputResource>,

    /// Resolved computed values from the last successful deploy
    #[serde(default)]
    pub computed_values: BTreeMap<String, serde_json::Value>,

    /// Secret references from the last successful deploy
    #[serde(default)]
    pub secret_values: BTreeMap<String, SecretReference>,
}

impl ResourceRecord {
    /// Empty record for a resource that has never been deployed.
    pub fn new(id: &ResourceId) -> Self {
        Self {
            id: id.to_string(),
            name: id.name().to_string(),
            resource_type: id.resource_type(),
            provisioning_state: ProvisioningState::Accepted,
            properties: serde_json::Value::Null,
            output_resources: Vec::new(),
            computed_values: BTreeMap::new(),
            secret_values: BTreeMap::new(),
        }
    }

    /// Fold a deployment outcome into the record and mark it Succeeded.
    pub fn apply_deployment_output(&mut self, output: DeploymentOutput) {
        self.output_resources = output.resources;
        self.computed_values = output.computed_values;
        self.secret_values = output.secret_values;
        self.provisioning_state = ProvisioningState::Succeeded;
    }
}
