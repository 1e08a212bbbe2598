//! Query model for scope-level enumeration

use crate::object::Object;
use serde::{Deserialize, Serialize};

/// A scoped query over stored resources.
///
/// Matches resources that are direct children of `root_scope` (an id nested
/// under a deeper sub-scope is not returned), optionally narrowed to one
/// resource type and filtered on data fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Scope prefix to enumerate (e.g. "/planes/radius/local/resourcegroups/rg0")
    pub root_scope: String,

    /// Qualified resource type (e.g. "applications.core/containers"); `None`
    /// matches every type under the scope.
    pub resource_type: Option<String>,

    /// Field filters, all of which must match
    pub filters: Vec<QueryFilter>,
}

impl Query {
    pub fn scoped(root_scope: impl Into<String>) -> Self {
        Self {
            root_scope: root_scope.into(),
            ..Default::default()
        }
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into().to_ascii_lowercase());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(QueryFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }
}

/// Equality filter on a top-level field of the stored data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFilter {
    pub field: String,
    pub value: String,
}

/// One page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Matching objects, in stable (id-ordered) sequence
    pub items: Vec<Object>,

    /// Continuation token for the next page; `None` when exhausted
    pub pagination_token: Option<String>,
}
