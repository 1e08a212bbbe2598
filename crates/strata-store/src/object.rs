//! Stored object and entity tag types

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Opaque version token used for optimistic concurrency control.
///
/// A fresh tag is issued on every successful mutation; presenting a stale tag
/// on Save or Delete fails the call without touching the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Issue a new, unique tag.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ETag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ETag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Store-owned metadata attached to every object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Resource id the object is stored under
    pub id: String,

    /// Current entity tag; `None` until the first successful Save
    pub etag: Option<ETag>,
}

/// One stored document: metadata plus type-specific data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    pub metadata: Metadata,
    pub data: serde_json::Value,
}

impl Object {
    /// Build an object from any serializable data shape.
    pub fn new<T: Serialize>(id: impl Into<String>, data: &T) -> Result<Self> {
        Ok(Self {
            metadata: Metadata {
                id: id.into(),
                etag: None,
            },
            data: serde_json::to_value(data)?,
        })
    }

    /// Decode the data payload into a typed shape.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
