//! Per-call store options
//!
//! Options are plain structs with documented defaults; the `with_*` helpers
//! are convenience builders, not part of the contract.

use crate::object::ETag;

/// Default page size for Query when no cap is supplied.
pub const DEFAULT_QUERY_PAGE_SIZE: usize = 20;

/// Options for `Get`. Currently empty; present so the call surface stays
/// stable when read options are added.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {}

/// Options for `Query`
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Resume point returned by a previous page; `None` starts from the top.
    pub pagination_token: Option<String>,

    /// Maximum items per page; defaults to [`DEFAULT_QUERY_PAGE_SIZE`].
    pub max_item_count: Option<usize>,
}

impl QueryOptions {
    pub fn with_pagination_token(mut self, token: impl Into<String>) -> Self {
        self.pagination_token = Some(token.into());
        self
    }

    pub fn with_max_item_count(mut self, count: usize) -> Self {
        self.max_item_count = Some(count);
        self
    }
}

/// Options for `Save`
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Conditional-write token. `Some` fails the save with `ETagMismatch`
    /// when the stored tag differs; `None` overwrites unconditionally.
    pub etag: Option<ETag>,
}

impl SaveOptions {
    pub fn with_etag(mut self, etag: ETag) -> Self {
        self.etag = Some(etag);
        self
    }
}

/// Options for `Delete`, with the same tag-conditional semantics as `Save`
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub etag: Option<ETag>,
}

impl DeleteOptions {
    pub fn with_etag(mut self, etag: ETag) -> Self {
        self.etag = Some(etag);
        self
    }
}
