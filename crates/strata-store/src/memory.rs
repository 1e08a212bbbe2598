//! In-memory store implementation
//!
//! Backs the daemon in single-process deployments and every test in the
//! workspace. A `BTreeMap` keeps enumeration order deterministic, which makes
//! pagination tokens stable across calls.

use crate::client::StoreClient;
use crate::error::{Result, StoreError};
use crate::object::{ETag, Metadata, Object};
use crate::options::{DeleteOptions, GetOptions, QueryOptions, SaveOptions, DEFAULT_QUERY_PAGE_SIZE};
use crate::query::{Query, QueryResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredEntry {
    etag: ETag,
    data: serde_json::Value,
}

/// In-memory [`StoreClient`] implementation
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, StoredEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn normalize_key(id: &str) -> String {
    id.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Whether `key` is a direct child resource of `root_scope`, and if so its
/// qualified type ("namespace/type").
fn child_resource_type<'a>(key: &'a str, root_scope: &str) -> Option<String> {
    let rest = key.strip_prefix(root_scope)?.strip_prefix("/providers/")?;
    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [namespace, type_name, _name] => Some(format!("{namespace}/{type_name}")),
        _ => None,
    }
}

fn matches_filters(data: &serde_json::Value, query: &Query) -> bool {
    query.filters.iter().all(|f| match data.get(&f.field) {
        Some(serde_json::Value::String(s)) => s == &f.value,
        Some(other) => other.to_string() == f.value,
        None => false,
    })
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get(&self, id: &str, _options: GetOptions) -> Result<Object> {
        let key = normalize_key(id);
        let entries = self.entries.read().await;
        let entry = entries
            .get(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        Ok(Object {
            metadata: Metadata {
                id: key,
                etag: Some(entry.etag.clone()),
            },
            data: entry.data.clone(),
        })
    }

    async fn query(&self, query: Query, options: QueryOptions) -> Result<QueryResult> {
        if query.root_scope.is_empty() {
            return Err(StoreError::InvalidQuery(
                "root_scope must not be empty".to_string(),
            ));
        }
        let root_scope = normalize_key(&query.root_scope);
        let page_size = options.max_item_count.unwrap_or(DEFAULT_QUERY_PAGE_SIZE);
        if page_size == 0 {
            return Err(StoreError::InvalidQuery(
                "max_item_count must be positive".to_string(),
            ));
        }

        let entries = self.entries.read().await;
        let mut items = Vec::new();
        let mut pagination_token = None;
        for (key, entry) in entries.iter() {
            // Resume strictly after the token so pages never overlap.
            if let Some(token) = &options.pagination_token {
                if key.as_str() <= token.as_str() {
                    continue;
                }
            }
            let Some(resource_type) = child_resource_type(key, &root_scope) else {
                continue;
            };
            if let Some(wanted) = &query.resource_type {
                if &resource_type != wanted {
                    continue;
                }
            }
            if !matches_filters(&entry.data, &query) {
                continue;
            }
            if items.len() == page_size {
                // A further match exists, so the current page is not the last.
                pagination_token = items.last().map(|o: &Object| o.metadata.id.clone());
                break;
            }
            items.push(Object {
                metadata: Metadata {
                    id: key.clone(),
                    etag: Some(entry.etag.clone()),
                },
                data: entry.data.clone(),
            });
        }
        Ok(QueryResult {
            items,
            pagination_token,
        })
    }

    async fn save(&self, object: &mut Object, options: SaveOptions) -> Result<()> {
        let key = normalize_key(&object.metadata.id);
        let mut entries = self.entries.write().await;
        if let Some(expected) = &options.etag {
            match entries.get(&key) {
                None => return Err(StoreError::NotFound(key)),
                Some(entry) if &entry.etag != expected => {
                    return Err(StoreError::ETagMismatch(key));
                }
                Some(_) => {}
            }
        }
        let etag = ETag::generate();
        tracing::debug!(id = %key, etag = %etag, "saving object");
        entries.insert(
            key.clone(),
            StoredEntry {
                etag: etag.clone(),
                data: object.data.clone(),
            },
        );
        object.metadata.id = key;
        object.metadata.etag = Some(etag);
        Ok(())
    }

    async fn delete(&self, id: &str, options: DeleteOptions) -> Result<()> {
        let key = normalize_key(id);
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get(&key) else {
            return Err(StoreError::NotFound(key));
        };
        if let Some(expected) = &options.etag {
            if &entry.etag != expected {
                return Err(StoreError::ETagMismatch(key));
            }
        }
        tracing::debug!(id = %key, "deleting object");
        entries.remove(&key);
        Ok(())
    }
}
