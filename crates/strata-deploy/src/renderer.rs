//! Renderer capability trait and registry

use crate::error::Result;
use crate::resource::{ComputedValue, OutputResource, ResourceDefinition};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use strata_resources::ResourceId;

/// Resource ids a definition depends on, split by sensitivity
#[derive(Debug, Clone, Default)]
pub struct DependencyIds {
    /// Plain resource dependencies
    pub resource_ids: Vec<ResourceId>,

    /// Dependencies whose values must be treated as secrets
    pub secret_ids: Vec<ResourceId>,
}

/// What a renderer produced for one resource definition
#[derive(Debug, Clone, Default)]
pub struct RendererOutput {
    /// Desired output resources, in declaration order. Declaration order is
    /// the tie-break for dependency ordering, so it is part of the contract.
    pub resources: Vec<OutputResource>,

    /// Named value references for downstream consumers
    pub computed_values: BTreeMap<String, ComputedValue>,
}

/// Capability that expands one declarative resource into output resources
/// and computed/secret value references
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Ids of the resources this definition depends on, used to order
    /// deployments across resources.
    async fn get_dependency_ids(&self, resource: &ResourceDefinition) -> Result<DependencyIds>;

    /// Expand the definition into the desired output resource set.
    async fn render(&self, resource: &ResourceDefinition) -> Result<RendererOutput>;
}

/// Maps a qualified resource type to its renderer.
///
/// Populated once at process start and read-only afterwards; lookups for
/// unregistered types are a normal error path handled by the processor.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer for a qualified resource type
    /// (e.g. "applications.core/containers"). Types are case-insensitive.
    pub fn register(mut self, resource_type: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        self.renderers
            .insert(resource_type.into().to_ascii_lowercase(), renderer);
        self
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<dyn Renderer>> {
        self.renderers
            .get(&resource_type.to_ascii_lowercase())
            .cloned()
    }

    /// Whether any renderer is registered for the type.
    pub fn supports(&self, resource_type: &str) -> bool {
        self.renderers
            .contains_key(&resource_type.to_ascii_lowercase())
    }
}
