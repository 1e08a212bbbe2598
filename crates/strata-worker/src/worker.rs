//! Async operation worker

use crate::controller::ControllerRegistry;
use crate::error::{Result, WorkerError};
use crate::record::ResourceRecord;
use crate::request::{Request, DEFAULT_OPERATION_TIMEOUT};
use crate::status::{AsyncOperationStatus, ProvisioningState};
use std::sync::Arc;
use std::time::Duration;
use strata_resources::ResourceId;
use strata_store::{GetOptions, Object, SaveOptions, StoreClient};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

/// Worker tuning knobs
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Maximum operations in flight at once
    pub max_concurrency: usize,

    /// Timeout applied to requests that carry none
    pub default_timeout: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            default_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// Drives accepted operations through the provisioning state machine.
///
/// Each operation runs on its own task under a timeout; the operation's
/// status record is the only synchronous output, and the store's entity tag
/// check is the only serialization point between concurrent operations.
pub struct AsyncOperationWorker {
    store: Arc<dyn StoreClient>,
    controllers: Arc<ControllerRegistry>,
    options: WorkerOptions,
    semaphore: Arc<Semaphore>,
}

impl AsyncOperationWorker {
    pub fn new(
        store: Arc<dyn StoreClient>,
        controllers: Arc<ControllerRegistry>,
        options: WorkerOptions,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(options.max_concurrency));
        Self {
            store,
            controllers,
            options,
            semaphore,
        }
    }

    /// Consume requests from the channel, spawning one bounded task per
    /// operation. Returns when the channel closes and is cancel-safe: an
    /// in-flight operation either completes or is dropped at its timeout.
    pub async fn run(self: Arc<Self>, mut requests: mpsc::Receiver<Request>) {
        while let Some(request) = requests.recv().await {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                // Closed semaphore means we are shutting down.
                Err(_) => break,
            };
            let worker = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(err) = worker.process(&request).await {
                    error!(
                        operation_id = %request.operation_id,
                        error = %err,
                        "operation processing failed"
                    );
                }
            });
        }
        // Wait for in-flight operations before returning.
        let _ = self
            .semaphore
            .acquire_many(self.options.max_concurrency as u32)
            .await;
    }

    /// Process one operation end to end.
    ///
    /// Status record transitions: Updating on entry, then exactly one of
    /// Succeeded / Failed / Canceled. The timeout covers only the business
    /// controller; status writes happen outside it so a timed-out operation
    /// is still recorded as Canceled.
    pub async fn process(&self, request: &Request) -> Result<()> {
        let mut status = AsyncOperationStatus::updating(request);
        let status_id = match operation_status_id(request) {
            Ok(id) => id,
            Err(err) => {
                // The target id cannot anchor a status record, so pollers of
                // this operation still get a terminal state under the
                // service-owned scope.
                status.complete(ProvisioningState::Failed, Some(err.to_details()));
                self.save_status(&fallback_status_id(request), &status)
                    .await?;
                return Err(err);
            }
        };

        let Some(controller) = self.controllers.get(&request.operation_type.to_string()) else {
            let err = WorkerError::UnknownOperationType(request.operation_type.to_string());
            status.complete(ProvisioningState::Failed, Some(err.to_details()));
            self.save_status(&status_id, &status).await?;
            return Err(err);
        };

        self.save_status(&status_id, &status).await?;
        info!(
            operation_id = %request.operation_id,
            operation_type = %request.operation_type,
            resource_id = %request.resource_id,
            "processing operation"
        );

        let budget = request.timeout.unwrap_or(self.options.default_timeout);
        match tokio::time::timeout(budget, controller.run(request)).await {
            Ok(Ok(result)) => {
                info!(operation_id = %request.operation_id, "operation completed");
                status.complete(result.state, None);
            }
            Ok(Err(err)) => {
                warn!(
                    operation_id = %request.operation_id,
                    error = %err,
                    "operation failed"
                );
                self.mark_resource_failed(request).await;
                status.complete(ProvisioningState::Failed, Some(err.to_details()));
            }
            Err(_elapsed) => {
                // The controller future was dropped at the deadline, so no
                // half-applied result can reach Save. Already-applied output
                // resources are left for a retry to reconcile.
                warn!(
                    operation_id = %request.operation_id,
                    timeout = ?budget,
                    "operation timed out"
                );
                let err = WorkerError::Timeout(budget);
                status.complete(ProvisioningState::Canceled, Some(err.to_details()));
            }
        }
        self.save_status(&status_id, &status).await
    }

    async fn save_status(&self, status_id: &str, status: &AsyncOperationStatus) -> Result<()> {
        let mut object = Object::new(status_id, status)?;
        // The worker is the only writer of the status record.
        self.store.save(&mut object, SaveOptions::default()).await?;
        Ok(())
    }

    /// Best-effort: stamp Failed onto the resource record after a controller
    /// error. A missing record (pure create that never saved) is fine.
    async fn mark_resource_failed(&self, request: &Request) {
        let outcome: Result<()> = async {
            let object = self
                .store
                .get(&request.resource_id, GetOptions::default())
                .await?;
            let mut record: ResourceRecord = object.data_as()?;
            record.provisioning_state = ProvisioningState::Failed;
            let mut updated = Object::new(object.metadata.id.clone(), &record)?;
            let options = match object.metadata.etag {
                Some(etag) => SaveOptions::default().with_etag(etag),
                None => SaveOptions::default(),
            };
            self.store.save(&mut updated, options).await?;
            Ok(())
        }
        .await;
        if let Err(err) = outcome {
            if !matches!(&err, WorkerError::Store(e) if e.is_not_found()) {
                warn!(
                    resource_id = %request.resource_id,
                    error = %err,
                    "failed to mark resource as failed"
                );
            }
        }
    }
}

/// Store id of the operation's status record: one entry per operation id,
/// under the target resource's root scope, independent of the resource's own
/// record.
fn operation_status_id(request: &Request) -> Result<String> {
    let id = ResourceId::parse(&request.resource_id)?;
    Ok(format!(
        "{}/providers/{}/operationstatuses/{}",
        id.root_scope(),
        id.provider_namespace(),
        request.operation_id
    ))
}

/// Status location for operations whose target id never parsed. Lives under a
/// scope the service owns so the record is reachable by operation id alone.
fn fallback_status_id(request: &Request) -> String {
    format!(
        "/planes/strata/local/providers/system.operations/operationstatuses/{}",
        request.operation_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, ControllerResult};
    use crate::create_or_update::CreateOrUpdateResource;
    use crate::request::{OperationMethod, OperationType};
    use crate::status::codes;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use strata_deploy::{
        DeployError, DeploymentProcessor, HandlerRegistry, OutputResource, PutResult, Renderer,
        RendererOutput, RendererRegistry, ResourceDefinition, ResourceHandler, ResourceIdentity,
    };
    use strata_store::InMemoryStore;
    use uuid::Uuid;

    const CONTAINER_TYPE: &str = "applications.core/containers";
    const KIND: &str = "kubernetes/apps.deployment";
    const RESOURCE_ID: &str =
        "/planes/radius/local/resourcegroups/rg0/providers/applications.core/containers/web";

    struct FixedRenderer {
        resources: Vec<OutputResource>,
        calls: Mutex<usize>,
    }

    impl FixedRenderer {
        fn new(resources: Vec<OutputResource>) -> Self {
            Self {
                resources,
                calls: Mutex::new(0),
            }
        }

        fn render_calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Renderer for FixedRenderer {
        async fn get_dependency_ids(
            &self,
            _resource: &ResourceDefinition,
        ) -> strata_deploy::Result<strata_deploy::DependencyIds> {
            Ok(Default::default())
        }

        async fn render(
            &self,
            _resource: &ResourceDefinition,
        ) -> strata_deploy::Result<RendererOutput> {
            *self.calls.lock().unwrap() += 1;
            Ok(RendererOutput {
                resources: self.resources.clone(),
                computed_values: BTreeMap::new(),
            })
        }
    }

    /// Handler recording calls; optionally failing or hanging on Put.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
        fail_put: bool,
        hang_put: bool,
    }

    impl RecordingHandler {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ResourceHandler for RecordingHandler {
        async fn put(&self, resource: &OutputResource) -> strata_deploy::Result<PutResult> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("put:{}", resource.local_id));
            if self.hang_put {
                // Stand-in for a platform call that never returns.
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail_put {
                return Err(DeployError::Platform("simulated put failure".to_string()));
            }
            Ok(PutResult {
                identity: ResourceIdentity {
                    kind: resource.kind.clone(),
                    id: format!("platform/{}", resource.local_id),
                },
                properties: BTreeMap::new(),
            })
        }

        async fn delete(&self, resource: &OutputResource) -> strata_deploy::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete:{}", resource.local_id));
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        renderer: Arc<FixedRenderer>,
        handler: Arc<RecordingHandler>,
        worker: AsyncOperationWorker,
    }

    fn fixture(renderer: FixedRenderer, handler: RecordingHandler) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let renderer = Arc::new(renderer);
        let handler = Arc::new(handler);
        let renderers = RendererRegistry::new().register(CONTAINER_TYPE, renderer.clone());
        let handlers = HandlerRegistry::new().register(KIND, handler.clone());
        let processor = Arc::new(DeploymentProcessor::new(
            Arc::new(renderers),
            Arc::new(handlers),
        ));
        let create_or_update = Arc::new(CreateOrUpdateResource::new(store.clone(), processor));
        let controllers = ControllerRegistry::new()
            .register(
                OperationType::new(CONTAINER_TYPE, OperationMethod::Put).to_string(),
                create_or_update.clone(),
            )
            .register(
                OperationType::new(CONTAINER_TYPE, OperationMethod::Patch).to_string(),
                create_or_update,
            );
        let worker = AsyncOperationWorker::new(
            store.clone(),
            Arc::new(controllers),
            WorkerOptions::default(),
        );
        Fixture {
            store,
            renderer,
            handler,
            worker,
        }
    }

    fn request(method: OperationMethod, timeout: Option<Duration>) -> Request {
        Request {
            operation_id: Uuid::new_v4(),
            operation_type: OperationType::new(CONTAINER_TYPE, method),
            resource_id: RESOURCE_ID.to_string(),
            correlation_id: None,
            timeout,
        }
    }

    async fn status_of(store: &InMemoryStore, request: &Request) -> AsyncOperationStatus {
        let id = operation_status_id(request).unwrap();
        store
            .get(&id, GetOptions::default())
            .await
            .unwrap()
            .data_as()
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_create_end_to_end() {
        let f = fixture(
            FixedRenderer::new(vec![
                OutputResource::new("b", KIND).with_dependency("a"),
                OutputResource::new("a", KIND),
            ]),
            RecordingHandler::default(),
        );
        let request = request(OperationMethod::Put, None);

        f.worker.process(&request).await.unwrap();

        // Dependencies applied first.
        assert_eq!(f.handler.calls(), vec!["put:a", "put:b"]);

        let object = f.store.get(RESOURCE_ID, GetOptions::default()).await.unwrap();
        assert!(object.metadata.etag.is_some());
        let record: ResourceRecord = object.data_as().unwrap();
        assert_eq!(record.provisioning_state, ProvisioningState::Succeeded);
        assert_eq!(record.output_resources.len(), 2);

        let status = status_of(&f.store, &request).await;
        assert_eq!(status.status, ProvisioningState::Succeeded);
        assert!(status.error.is_none());
        assert!(status.end_time.is_some());
    }

    #[tokio::test]
    async fn test_patch_not_found_fails_without_render() {
        let f = fixture(FixedRenderer::new(vec![]), RecordingHandler::default());
        let request = request(OperationMethod::Patch, None);

        f.worker.process(&request).await.unwrap();

        assert_eq!(f.renderer.render_calls(), 0);
        let status = status_of(&f.store, &request).await;
        assert_eq!(status.status, ProvisioningState::Failed);
        assert_eq!(status.error.unwrap().code, codes::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_operation_type_is_fatal() {
        let f = fixture(FixedRenderer::new(vec![]), RecordingHandler::default());
        let req = request(OperationMethod::Delete, None);

        let err = f.worker.process(&req).await.unwrap_err();
        assert!(matches!(err, WorkerError::UnknownOperationType(_)));

        let status = status_of(&f.store, &req).await;
        assert_eq!(status.status, ProvisioningState::Failed);
        assert_eq!(status.error.unwrap().code, codes::INVALID_OPERATION_TYPE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_mid_deploy_cancels_without_save() {
        let f = fixture(
            FixedRenderer::new(vec![OutputResource::new("a", KIND)]),
            RecordingHandler {
                hang_put: true,
                ..Default::default()
            },
        );
        let request = request(OperationMethod::Put, Some(Duration::from_secs(5)));

        f.worker.process(&request).await.unwrap();

        let status = status_of(&f.store, &request).await;
        assert_eq!(status.status, ProvisioningState::Canceled);
        assert_eq!(status.error.unwrap().code, codes::OPERATION_CANCELED);

        // The deploy was dropped mid-flight; Save never ran.
        let err = f
            .store
            .get(RESOURCE_ID, GetOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(f.handler.calls(), vec!["put:a"]);
    }

    #[tokio::test]
    async fn test_controller_failure_marks_resource_failed() {
        let f = fixture(
            FixedRenderer::new(vec![OutputResource::new("a", KIND)]),
            RecordingHandler {
                fail_put: true,
                ..Default::default()
            },
        );
        // Pre-seed the record so the best-effort failure stamp has a target.
        let id = ResourceId::parse(RESOURCE_ID).unwrap();
        let mut record = ResourceRecord::new(&id);
        record.properties = json!({"image": "nginx"});
        let mut object = Object::new(id.as_str(), &record).unwrap();
        f.store.save(&mut object, SaveOptions::default()).await.unwrap();

        let request = request(OperationMethod::Put, None);
        f.worker.process(&request).await.unwrap();

        let status = status_of(&f.store, &request).await;
        assert_eq!(status.status, ProvisioningState::Failed);
        assert_eq!(status.error.unwrap().code, codes::INTERNAL);

        let record: ResourceRecord = f
            .store
            .get(RESOURCE_ID, GetOptions::default())
            .await
            .unwrap()
            .data_as()
            .unwrap();
        assert_eq!(record.provisioning_state, ProvisioningState::Failed);
    }

    #[tokio::test]
    async fn test_malformed_resource_id_records_failed_status() {
        let f = fixture(FixedRenderer::new(vec![]), RecordingHandler::default());
        let mut req = request(OperationMethod::Put, None);
        req.resource_id = "not a resource id".to_string();

        let err = f.worker.process(&req).await.unwrap_err();
        assert!(matches!(err, WorkerError::ResourceId(_)));

        // The terminal status lands under the service-owned fallback scope.
        let status: AsyncOperationStatus = f
            .store
            .get(&fallback_status_id(&req), GetOptions::default())
            .await
            .unwrap()
            .data_as()
            .unwrap();
        assert_eq!(status.status, ProvisioningState::Failed);
        assert_eq!(status.error.unwrap().code, codes::MALFORMED_ID);
        assert!(status.end_time.is_some());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let f = fixture(
            FixedRenderer::new(vec![OutputResource::new("a", KIND)]),
            RecordingHandler::default(),
        );
        let worker = Arc::new(f.worker);
        let (tx, rx) = mpsc::channel(8);

        let join = tokio::spawn(Arc::clone(&worker).run(rx));
        let request = request(OperationMethod::Put, None);
        tx.send(request.clone()).await.unwrap();
        drop(tx);
        join.await.unwrap();

        let status = status_of(&f.store, &request).await;
        assert_eq!(status.status, ProvisioningState::Succeeded);
    }
}
