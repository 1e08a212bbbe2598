//! Create-or-update resource controller

use crate::controller::{Controller, ControllerResult};
use crate::error::Result;
use crate::record::ResourceRecord;
use crate::request::{OperationMethod, Request};
use async_trait::async_trait;
use std::sync::Arc;
use strata_deploy::{DeploymentProcessor, ResourceDefinition};
use strata_resources::ResourceId;
use strata_store::{GetOptions, Object, SaveOptions, StoreClient};
use tracing::debug;

/// The flagship business controller: drives one resource through
/// Render → Deploy → Delete-stale → Save.
///
/// Concurrency discipline: the entity tag is captured at Get, the
/// long-running deploy happens without any lock, and the tag is presented
/// again at Save. A lost race surfaces as `ETagMismatch`, which means
/// "reload and retry", not that the resource is in a bad state.
pub struct CreateOrUpdateResource {
    store: Arc<dyn StoreClient>,
    processor: Arc<DeploymentProcessor>,
}

impl CreateOrUpdateResource {
    pub fn new(store: Arc<dyn StoreClient>, processor: Arc<DeploymentProcessor>) -> Self {
        Self { store, processor }
    }
}

#[async_trait]
impl Controller for CreateOrUpdateResource {
    async fn run(&self, request: &Request) -> Result<ControllerResult> {
        let id = ResourceId::parse(&request.resource_id)?;

        let (previous, etag) = match self.store.get(id.as_str(), GetOptions::default()).await {
            Ok(object) => {
                let record: ResourceRecord = object.data_as()?;
                (Some(record), object.metadata.etag)
            }
            Err(err) if err.is_not_found() => {
                // There is nothing to patch; only PUT proceeds as a pure
                // create with an empty previous set.
                if request.operation_type.method == OperationMethod::Patch {
                    return Err(err.into());
                }
                (None, None)
            }
            Err(err) => return Err(err.into()),
        };

        let properties = previous
            .as_ref()
            .map(|record| record.properties.clone())
            .unwrap_or(serde_json::Value::Null);
        let definition = ResourceDefinition::new(id.clone(), properties);

        let rendered = self.processor.render(&definition).await?;
        let deployed = self.processor.deploy(&rendered).await?;

        if let Some(previous) = &previous {
            let stale =
                DeploymentProcessor::stale_resources(&previous.output_resources, &deployed.resources);
            debug!(resource_id = %id, stale = stale.len(), "deleting stale output resources");
            self.processor.delete(&stale).await?;
        }

        let mut record = previous.unwrap_or_else(|| ResourceRecord::new(&id));
        record.properties = definition.properties;
        record.apply_deployment_output(deployed);

        let mut object = Object::new(id.as_str(), &record)?;
        let options = match etag {
            Some(etag) => SaveOptions::default().with_etag(etag),
            None => SaveOptions::default(),
        };
        self.store.save(&mut object, options).await?;

        Ok(ControllerResult::default())
    }
}
