//! Resource handler capability trait and registry

use crate::error::Result;
use crate::resource::{OutputResource, ResourceIdentity};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Result of a successful handler Put
#[derive(Debug, Clone)]
pub struct PutResult {
    /// Identity of the platform object that was created or updated
    pub identity: ResourceIdentity,

    /// Runtime properties only knowable after the Put (assigned host,
    /// generated name, ...), keyed by property name
    pub properties: BTreeMap<String, String>,
}

/// Capability that creates/updates or removes one output resource against
/// its real platform.
///
/// Both operations must be idempotent enough that a retry after a transient
/// failure does not corrupt platform state.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Create or update the platform object for the output resource.
    async fn put(&self, resource: &OutputResource) -> Result<PutResult>;

    /// Remove the platform object.
    async fn delete(&self, resource: &OutputResource) -> Result<()>;
}

/// Maps an output resource kind to its handler.
///
/// Same lifecycle discipline as the renderer registry: built before any
/// request is served, read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an output resource kind
    /// (e.g. "kubernetes/apps.deployment"). Kinds are case-insensitive.
    pub fn register(mut self, kind: impl Into<String>, handler: Arc<dyn ResourceHandler>) -> Self {
        self.handlers.insert(kind.into().to_ascii_lowercase(), handler);
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.handlers.get(&kind.to_ascii_lowercase()).cloned()
    }
}
