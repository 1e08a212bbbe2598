//! Strata control-plane daemon
//!
//! Wires the engine together: in-memory store, renderer/handler registries,
//! deployment processor, and the async operation worker. The network front
//! door and the per-platform renderer/handler implementations are deployment
//! concerns registered here by embedders; the stock binary starts with empty
//! registries.

mod settings;

use anyhow::Result;
use clap::Parser;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use strata_deploy::{DeploymentProcessor, HandlerRegistry, RendererRegistry};
use strata_store::InMemoryStore;
use strata_worker::{
    AsyncOperationWorker, ControllerRegistry, CreateOrUpdateResource, OperationMethod,
    OperationType, Request, WorkerOptions,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stratad", version, about = "Strata control-plane daemon")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter (e.g. "info", "strata_worker=debug"); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::load(cli.config.as_deref())?;
    info!(
        max_concurrency = settings.worker.max_concurrency,
        default_timeout_secs = settings.worker.default_timeout_secs,
        "starting stratad"
    );

    let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
    // Embedders register platform renderers and handlers here.
    let renderers = Arc::new(RendererRegistry::new());
    let handlers = Arc::new(HandlerRegistry::new());
    let processor = Arc::new(DeploymentProcessor::new(renderers, handlers));

    let mut controllers = ControllerRegistry::new();
    if settings.resource_types.is_empty() {
        warn!("no resource types configured; submitted operations will fail");
    }
    for resource_type in &settings.resource_types {
        let controller = Arc::new(CreateOrUpdateResource::new(store.clone(), processor.clone()));
        for method in [OperationMethod::Put, OperationMethod::Patch] {
            controllers = controllers.register(
                OperationType::new(resource_type, method).to_string(),
                controller.clone(),
            );
        }
        info!(%resource_type, "registered create-or-update controller");
    }
    let controllers = Arc::new(controllers);

    let worker = Arc::new(AsyncOperationWorker::new(
        store,
        controllers,
        WorkerOptions {
            max_concurrency: settings.worker.max_concurrency,
            default_timeout: settings.worker.default_timeout(),
        },
    ));
    let (submit, requests) = mpsc::channel::<Request>(settings.worker.queue_depth);
    let worker_task = tokio::spawn(worker.run(requests));

    info!("stratad running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    // Closing the channel lets the worker drain in-flight operations.
    drop(submit);
    worker_task.await?;
    Ok(())
}
