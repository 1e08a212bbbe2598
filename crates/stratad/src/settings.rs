//! Daemon configuration
//!
//! Layered: built-in defaults, then the optional TOML config file, then
//! environment variables prefixed `STRATA_` (e.g.
//! `STRATA_WORKER__MAX_CONCURRENCY=32`).

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub worker: WorkerSettings,

    /// Qualified resource types served by this daemon; the create-or-update
    /// controller is registered for PUT and PATCH on each.
    pub resource_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Maximum operations in flight at once
    pub max_concurrency: usize,

    /// Timeout for operations that carry no explicit budget, in seconds
    pub default_timeout_secs: u64,

    /// Capacity of the operation submission channel
    pub queue_depth: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            default_timeout_secs: 120,
            queue_depth: 256,
        }
    }
}

impl WorkerSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

impl Settings {
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("STRATA").separator("__"))
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(settings)
    }
}
