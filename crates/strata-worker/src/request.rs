//! Operation request and operation type

use crate::error::{Result, WorkerError};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Timeout applied when a request carries none.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP-style verb of an operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMethod {
    Put,
    Patch,
    Delete,
    Get,
}

impl OperationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationMethod::Put => "PUT",
            OperationMethod::Patch => "PATCH",
            OperationMethod::Delete => "DELETE",
            OperationMethod::Get => "GET",
        }
    }
}

impl fmt::Display for OperationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation type: qualified resource type plus verb, rendered in the
/// `RESOURCETYPE|VERB` wire convention (e.g.
/// `APPLICATIONS.CORE/CONTAINERS|PUT`). Parsing is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationType {
    /// Qualified resource type, lowercased (e.g. "applications.core/containers")
    pub resource_type: String,

    /// Operation verb
    pub method: OperationMethod,
}

impl OperationType {
    pub fn new(resource_type: impl Into<String>, method: OperationMethod) -> Self {
        Self {
            resource_type: resource_type.into().to_ascii_lowercase(),
            method,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let (resource_type, method) = raw
            .split_once('|')
            .ok_or_else(|| WorkerError::MalformedOperationType(raw.to_string()))?;
        if resource_type.is_empty() {
            return Err(WorkerError::MalformedOperationType(raw.to_string()));
        }
        let method = match method.to_ascii_uppercase().as_str() {
            "PUT" => OperationMethod::Put,
            "PATCH" => OperationMethod::Patch,
            "DELETE" => OperationMethod::Delete,
            "GET" => OperationMethod::Get,
            _ => return Err(WorkerError::MalformedOperationType(raw.to_string())),
        };
        Ok(Self::new(resource_type, method))
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}",
            self.resource_type.to_ascii_uppercase(),
            self.method
        )
    }
}

impl FromStr for OperationType {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for OperationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for OperationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        OperationType::parse(&raw).map_err(de::Error::custom)
    }
}

/// An accepted operation, as handed to the worker by the front door.
///
/// Created once when the client's change is accepted, consumed exactly once,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Unique operation token
    pub operation_id: Uuid,

    /// What to do, in `RESOURCETYPE|VERB` form
    pub operation_type: OperationType,

    /// Target resource id (resource identifier string form)
    pub resource_id: String,

    /// Client-supplied correlation id for tracing across systems
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Operation timeout budget; [`DEFAULT_OPERATION_TIMEOUT`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_OPERATION_TIMEOUT)
    }
}
