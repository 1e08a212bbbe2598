//! Render / Deploy / Delete orchestration

use crate::error::{DeleteFailure, DeployError, Result};
use crate::graph::topological_order;
use crate::handler::HandlerRegistry;
use crate::renderer::{RendererOutput, RendererRegistry};
use crate::resource::{
    ComputedValue, DeploymentOutput, OutputResource, ResourceDefinition, SecretReference,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates one resource's render/deploy/delete cycle.
///
/// Holds no state of its own; it is a pure orchestration function over the
/// previous output resource set and the desired definition, dispatching to
/// the registered renderers and handlers.
pub struct DeploymentProcessor {
    renderers: Arc<RendererRegistry>,
    handlers: Arc<HandlerRegistry>,
}

impl DeploymentProcessor {
    pub fn new(renderers: Arc<RendererRegistry>, handlers: Arc<HandlerRegistry>) -> Self {
        Self {
            renderers,
            handlers,
        }
    }

    /// Whether a renderer is registered for the resource type.
    pub fn supports(&self, resource_type: &str) -> bool {
        self.renderers.supports(resource_type)
    }

    /// Expand the definition into its desired output resources.
    ///
    /// The declared dependency edges are validated here, so a cyclic or
    /// dangling graph is rejected before any handler runs.
    pub async fn render(&self, resource: &ResourceDefinition) -> Result<RendererOutput> {
        let resource_type = resource.id.resource_type();
        let renderer = self.renderers.get(&resource_type).ok_or_else(|| {
            DeployError::UnsupportedResourceType {
                resource_type: resource_type.clone(),
                resource_id: resource.id.to_string(),
            }
        })?;

        debug!(resource_id = %resource.id, %resource_type, "rendering resource");
        let output = renderer.render(resource).await?;
        topological_order(&output.resources)?;
        Ok(output)
    }

    /// Apply the rendered output resources in dependency order.
    ///
    /// Fail-fast: the first handler failure aborts further application, and
    /// the returned error carries the identities applied so far. On success
    /// the computed values are resolved against the deploy-time runtime
    /// properties and merged into the output.
    pub async fn deploy(&self, rendered: &RendererOutput) -> Result<DeploymentOutput> {
        let order = topological_order(&rendered.resources)?;

        // Resolve every handler up front so an unregistered kind fails
        // before the first Put.
        for resource in &rendered.resources {
            if self.handlers.get(&resource.kind).is_none() {
                return Err(DeployError::UnsupportedHandlerKind(resource.kind.clone()));
            }
        }

        let mut resources = rendered.resources.clone();
        let mut applied = Vec::new();
        let mut runtime_properties: HashMap<String, BTreeMap<String, String>> = HashMap::new();
        for idx in order {
            let resource = &resources[idx];
            let handler = self
                .handlers
                .get(&resource.kind)
                .ok_or_else(|| DeployError::UnsupportedHandlerKind(resource.kind.clone()))?;
            info!(local_id = %resource.local_id, kind = %resource.kind, "putting output resource");
            match handler.put(resource).await {
                Ok(put) => {
                    runtime_properties.insert(resource.local_id.clone(), put.properties);
                    resources[idx].identity = Some(put.identity.clone());
                    applied.push(put.identity);
                }
                Err(err) => {
                    warn!(local_id = %resource.local_id, error = %err, "put failed, aborting deploy");
                    return Err(DeployError::PutFailed {
                        local_id: resource.local_id.clone(),
                        message: err.to_string(),
                        applied,
                    });
                }
            }
        }

        let (computed_values, secret_values) =
            resolve_computed_values(&rendered.computed_values, &resources, &runtime_properties)?;
        Ok(DeploymentOutput {
            resources,
            computed_values,
            secret_values,
        })
    }

    /// Remove output resources, dependents before dependencies.
    ///
    /// Best-effort: unmanaged resources are skipped, every remaining
    /// resource is attempted, and individual failures are aggregated into a
    /// single `DeleteFailed` so one stuck resource does not block cleanup of
    /// the others.
    pub async fn delete(&self, resources: &[OutputResource]) -> Result<()> {
        // Dependencies pointing outside the deletion set stay deployed and
        // do not constrain the order.
        let scoped: Vec<OutputResource> = resources
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.depends_on
                    .retain(|dep| resources.iter().any(|other| &other.local_id == dep));
                r
            })
            .collect();
        let order = topological_order(&scoped)?;

        let mut failures = Vec::new();
        for idx in order.iter().rev() {
            let resource = &resources[*idx];
            if !resource.managed {
                debug!(local_id = %resource.local_id, "skipping unmanaged output resource");
                continue;
            }
            let Some(handler) = self.handlers.get(&resource.kind) else {
                failures.push(DeleteFailure {
                    local_id: resource.local_id.clone(),
                    message: DeployError::UnsupportedHandlerKind(resource.kind.clone()).to_string(),
                });
                continue;
            };
            info!(local_id = %resource.local_id, kind = %resource.kind, "deleting output resource");
            if let Err(err) = handler.delete(resource).await {
                warn!(local_id = %resource.local_id, error = %err, "delete failed, continuing");
                failures.push(DeleteFailure {
                    local_id: resource.local_id.clone(),
                    message: err.to_string(),
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeployError::DeleteFailed { failures })
        }
    }

    /// Output resources present in `previous` but no longer in `desired`,
    /// matched by local id. These are the candidates for [`Self::delete`].
    pub fn stale_resources(
        previous: &[OutputResource],
        desired: &[OutputResource],
    ) -> Vec<OutputResource> {
        previous
            .iter()
            .filter(|prev| !desired.iter().any(|d| d.local_id == prev.local_id))
            .cloned()
            .collect()
    }
}

fn resolve_computed_values(
    computed: &BTreeMap<String, ComputedValue>,
    resources: &[OutputResource],
    runtime_properties: &HashMap<String, BTreeMap<String, String>>,
) -> Result<(
    BTreeMap<String, serde_json::Value>,
    BTreeMap<String, SecretReference>,
)> {
    let mut values = BTreeMap::new();
    let mut secrets = BTreeMap::new();
    for (name, reference) in computed {
        match reference {
            ComputedValue::Literal { value } => {
                values.insert(name.clone(), value.clone());
            }
            ComputedValue::OutputResource { local_id, property } => {
                let unresolved = || DeployError::UnresolvedComputedValue {
                    name: name.clone(),
                    local_id: local_id.clone(),
                };
                let resource = resources
                    .iter()
                    .find(|r| &r.local_id == local_id)
                    .ok_or_else(unresolved)?;
                let from_runtime = runtime_properties
                    .get(local_id)
                    .and_then(|props| props.get(property))
                    .cloned();
                let value = match from_runtime {
                    Some(v) => v,
                    // "id" falls back to the platform identity.
                    None if property == "id" => resource
                        .identity
                        .as_ref()
                        .map(|i| i.id.clone())
                        .ok_or_else(unresolved)?,
                    None => return Err(unresolved()),
                };
                values.insert(name.clone(), serde_json::Value::String(value));
            }
            ComputedValue::Secret(reference) => {
                secrets.insert(name.clone(), reference.clone());
            }
        }
    }
    Ok((values, secrets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{PutResult, ResourceHandler};
    use crate::renderer::{DependencyIds, Renderer};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use strata_resources::ResourceId;

    const CONTAINER_TYPE: &str = "applications.core/containers";
    const KIND: &str = "kubernetes/apps.deployment";

    fn container_definition() -> ResourceDefinition {
        let id = ResourceId::parse(
            "/planes/radius/local/resourcegroups/rg0/providers/applications.core/containers/web",
        )
        .unwrap();
        ResourceDefinition::new(id, json!({"image": "nginx"}))
    }

    /// Renderer returning a fixed output resource set.
    struct FixedRenderer {
        output: RendererOutput,
    }

    #[async_trait]
    impl Renderer for FixedRenderer {
        async fn get_dependency_ids(&self, _resource: &ResourceDefinition) -> Result<DependencyIds> {
            Ok(DependencyIds::default())
        }

        async fn render(&self, _resource: &ResourceDefinition) -> Result<RendererOutput> {
            Ok(RendererOutput {
                resources: self.output.resources.clone(),
                computed_values: self.output.computed_values.clone(),
            })
        }
    }

    /// Handler recording every call, optionally failing selected local ids.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
        fail_put: Option<String>,
        fail_delete: Vec<String>,
    }

    impl RecordingHandler {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceHandler for RecordingHandler {
        async fn put(&self, resource: &OutputResource) -> Result<PutResult> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("put:{}", resource.local_id));
            if self.fail_put.as_deref() == Some(resource.local_id.as_str()) {
                return Err(DeployError::Platform("simulated put failure".to_string()));
            }
            Ok(PutResult {
                identity: crate::resource::ResourceIdentity {
                    kind: resource.kind.clone(),
                    id: format!("platform/{}", resource.local_id),
                },
                properties: BTreeMap::from([(
                    "host".to_string(),
                    format!("{}.internal", resource.local_id),
                )]),
            })
        }

        async fn delete(&self, resource: &OutputResource) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete:{}", resource.local_id));
            if self.fail_delete.iter().any(|id| id == &resource.local_id) {
                return Err(DeployError::Platform("simulated delete failure".to_string()));
            }
            Ok(())
        }
    }

    fn processor_with(
        output: RendererOutput,
        handler: Arc<RecordingHandler>,
    ) -> DeploymentProcessor {
        let renderers = RendererRegistry::new()
            .register(CONTAINER_TYPE, Arc::new(FixedRenderer { output }));
        let handlers = HandlerRegistry::new().register(KIND, handler);
        DeploymentProcessor::new(Arc::new(renderers), Arc::new(handlers))
    }

    #[tokio::test]
    async fn test_render_unsupported_type_message() {
        let processor = DeploymentProcessor::new(
            Arc::new(RendererRegistry::new()),
            Arc::new(HandlerRegistry::new()),
        );
        let definition = container_definition();
        let err = processor.render(&definition).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid resource type: \"{CONTAINER_TYPE}\" for dependent resource ID: \"{}\"",
                definition.id
            )
        );
    }

    #[tokio::test]
    async fn test_render_rejects_cycle_before_any_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let output = RendererOutput {
            resources: vec![
                OutputResource::new("a", KIND).with_dependency("b"),
                OutputResource::new("b", KIND).with_dependency("a"),
            ],
            computed_values: BTreeMap::new(),
        };
        let processor = processor_with(output, handler.clone());
        let err = processor.render(&container_definition()).await.unwrap_err();
        assert!(matches!(err, DeployError::DependencyCycle(_)));
        assert!(handler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_applies_in_dependency_order() {
        let handler = Arc::new(RecordingHandler::default());
        let output = RendererOutput {
            resources: vec![
                OutputResource::new("b", KIND).with_dependency("a"),
                OutputResource::new("a", KIND),
            ],
            computed_values: BTreeMap::from([
                (
                    "replicas".to_string(),
                    ComputedValue::Literal { value: json!(3) },
                ),
                (
                    "host".to_string(),
                    ComputedValue::OutputResource {
                        local_id: "b".to_string(),
                        property: "host".to_string(),
                    },
                ),
                (
                    "deploymentId".to_string(),
                    ComputedValue::OutputResource {
                        local_id: "a".to_string(),
                        property: "id".to_string(),
                    },
                ),
                (
                    "password".to_string(),
                    ComputedValue::Secret(SecretReference {
                        store: "vault0".to_string(),
                        key: "db-password".to_string(),
                    }),
                ),
            ]),
        };
        let processor = processor_with(output.clone(), handler.clone());

        let deployed = processor.deploy(&output).await.unwrap();
        assert_eq!(handler.calls(), vec!["put:a", "put:b"]);
        assert!(deployed.resources.iter().all(|r| r.identity.is_some()));
        assert_eq!(deployed.computed_values["replicas"], json!(3));
        assert_eq!(deployed.computed_values["host"], json!("b.internal"));
        assert_eq!(deployed.computed_values["deploymentId"], json!("platform/a"));
        assert_eq!(
            deployed.secret_values["password"],
            SecretReference {
                store: "vault0".to_string(),
                key: "db-password".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_deploy_aborts_on_first_failure_with_partial_identities() {
        let handler = Arc::new(RecordingHandler {
            fail_put: Some("b".to_string()),
            ..Default::default()
        });
        // Chain a -> b -> c; b fails, c must never be attempted.
        let output = RendererOutput {
            resources: vec![
                OutputResource::new("a", KIND),
                OutputResource::new("b", KIND).with_dependency("a"),
                OutputResource::new("c", KIND).with_dependency("b"),
            ],
            computed_values: BTreeMap::new(),
        };
        let processor = processor_with(output.clone(), handler.clone());

        let err = processor.deploy(&output).await.unwrap_err();
        match err {
            DeployError::PutFailed {
                local_id, applied, ..
            } => {
                assert_eq!(local_id, "b");
                assert_eq!(applied.len(), 1);
                assert_eq!(applied[0].id, "platform/a");
            }
            other => panic!("expected PutFailed, got {other:?}"),
        }
        assert_eq!(handler.calls(), vec!["put:a", "put:b"]);
    }

    #[tokio::test]
    async fn test_deploy_fails_fast_on_unregistered_kind() {
        let handler = Arc::new(RecordingHandler::default());
        let output = RendererOutput {
            resources: vec![
                OutputResource::new("a", KIND),
                OutputResource::new("b", "unknown/kind"),
            ],
            computed_values: BTreeMap::new(),
        };
        let processor = processor_with(output.clone(), handler.clone());

        let err = processor.deploy(&output).await.unwrap_err();
        assert!(matches!(err, DeployError::UnsupportedHandlerKind(_)));
        assert!(handler.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reverse_order_skips_unmanaged() {
        let handler = Arc::new(RecordingHandler::default());
        let resources = vec![
            OutputResource::new("a", KIND),
            OutputResource::new("b", KIND).with_dependency("a"),
            OutputResource::new("external", KIND).unmanaged(),
        ];
        let processor = processor_with(RendererOutput::default(), handler.clone());

        processor.delete(&resources).await.unwrap();
        // Dependents first, unmanaged never touched.
        assert_eq!(handler.calls(), vec!["delete:b", "delete:a"]);
    }

    #[tokio::test]
    async fn test_delete_aggregates_failures() {
        let handler = Arc::new(RecordingHandler {
            fail_delete: vec!["a".to_string(), "c".to_string()],
            ..Default::default()
        });
        let resources = vec![
            OutputResource::new("a", KIND),
            OutputResource::new("b", KIND),
            OutputResource::new("c", KIND),
        ];
        let processor = processor_with(RendererOutput::default(), handler.clone());

        let err = processor.delete(&resources).await.unwrap_err();
        match err {
            DeployError::DeleteFailed { failures } => {
                let mut failed: Vec<&str> =
                    failures.iter().map(|f| f.local_id.as_str()).collect();
                failed.sort();
                assert_eq!(failed, vec!["a", "c"]);
            }
            other => panic!("expected DeleteFailed, got {other:?}"),
        }
        // b was still attempted despite the failures around it.
        assert!(handler.calls().contains(&"delete:b".to_string()));
    }

    #[tokio::test]
    async fn test_delete_ignores_dependencies_outside_the_set() {
        let handler = Arc::new(RecordingHandler::default());
        // Stale resource depends on one that stays deployed.
        let resources = vec![OutputResource::new("stale", KIND).with_dependency("kept")];
        let processor = processor_with(RendererOutput::default(), handler.clone());

        processor.delete(&resources).await.unwrap();
        assert_eq!(handler.calls(), vec!["delete:stale"]);
    }

    #[test]
    fn test_stale_resources_diff() {
        let previous = vec![
            OutputResource::new("a", KIND),
            OutputResource::new("b", KIND),
        ];
        let desired = vec![OutputResource::new("b", KIND)];
        let stale = DeploymentProcessor::stale_resources(&previous, &desired);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].local_id, "a");
    }
}
