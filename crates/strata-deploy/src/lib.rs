//! Strata deployment processor
//!
//! Turns one declarative resource definition into the set of underlying
//! platform resources that realize it, and keeps that set in sync:
//!
//! 1. **Render**: the renderer registered for the resource type expands the
//!    definition into output resources plus computed/secret value references,
//!    and the declared dependencies are validated to form a DAG.
//! 2. **Deploy**: output resources are applied in dependency order through
//!    the handler registered for each kind; the first failure aborts the rest.
//! 3. **Delete**: output resources no longer desired are removed in reverse
//!    dependency order; failures are collected so one stuck resource does not
//!    block cleanup of the others.
//!
//! Renderers and handlers are external capabilities; this crate defines their
//! contracts and the registries that route to them.

pub mod error;
pub mod graph;
pub mod handler;
pub mod processor;
pub mod renderer;
pub mod resource;

pub use error::{DeleteFailure, DeployError, Result};
pub use handler::{HandlerRegistry, PutResult, ResourceHandler};
pub use processor::DeploymentProcessor;
pub use renderer::{DependencyIds, Renderer, RendererOutput, RendererRegistry};
pub use resource::{
    ComputedValue, DeploymentOutput, OutputResource, ResourceDefinition, ResourceIdentity,
    SecretReference,
};
