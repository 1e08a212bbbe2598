//! Output resource and computed value data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_resources::ResourceId;

/// A declarative resource definition, as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Identifier of the resource; its type selects the renderer
    pub id: ResourceId,

    /// Type-specific desired-state properties
    pub properties: serde_json::Value,
}

impl ResourceDefinition {
    pub fn new(id: ResourceId, properties: serde_json::Value) -> Self {
        Self { id, properties }
    }
}

/// Identity of a concrete platform object, populated after a successful Put
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Output resource kind the identity belongs to
    pub kind: String,

    /// Platform-native identifier (ARN, Kubernetes object key, ...)
    pub id: String,
}

impl std::fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// One underlying platform resource produced by rendering a definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputResource {
    /// Graph-local key; unique within one renderer output, not globally
    pub local_id: String,

    /// Handler routing key (e.g. "kubernetes/apps.deployment")
    pub kind: String,

    /// Identity of the platform object once created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ResourceIdentity>,

    /// Whether this engine owns the resource's lifecycle. Unmanaged
    /// resources are never deleted by the engine.
    pub managed: bool,

    /// Local ids that must be applied before this resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Desired configuration handed to the handler
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl OutputResource {
    pub fn new(local_id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            kind: kind.into(),
            identity: None,
            managed: true,
            depends_on: Vec::new(),
            properties: serde_json::Value::Null,
        }
    }

    pub fn with_dependency(mut self, local_id: impl Into<String>) -> Self {
        self.depends_on.push(local_id.into());
        self
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn unmanaged(mut self) -> Self {
        self.managed = false;
        self
    }
}

/// Location of a secret in an external secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    /// Secret store identifier
    pub store: String,

    /// Key within the store
    pub key: String,
}

/// A named value reference produced by a renderer.
///
/// Closed set of variants, discriminated by `kind`; consumers match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputedValue {
    /// A literal value known at render time
    Literal { value: serde_json::Value },

    /// A value only knowable after Deploy, read from an output resource's
    /// runtime properties (or its identity, via the property "id")
    OutputResource { local_id: String, property: String },

    /// A pointer into an external secret store; resolved by consumers, never
    /// dereferenced by the engine
    Secret(SecretReference),
}

/// Result of a Deploy pass, merged and ready for persistence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentOutput {
    /// Output resources with identities populated, in renderer order
    pub resources: Vec<OutputResource>,

    /// Resolved computed values (render-time literals merged with
    /// deploy-time runtime values)
    pub computed_values: BTreeMap<String, serde_json::Value>,

    /// Secret references, carried through unresolved
    pub secret_values: BTreeMap<String, SecretReference>,
}
