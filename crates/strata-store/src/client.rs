//! Store client trait definition

use crate::error::Result;
use crate::object::Object;
use crate::options::{DeleteOptions, GetOptions, QueryOptions, SaveOptions};
use crate::query::{Query, QueryResult};
use async_trait::async_trait;

/// Document store abstraction
///
/// All control-plane state flows through this trait. Ids are treated
/// case-insensitively (normalized to lowercase), matching the resource
/// identifier contract.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch one object. Fails with `NotFound` if the id is absent; the
    /// returned object's entity tag reflects the current version.
    async fn get(&self, id: &str, options: GetOptions) -> Result<Object>;

    /// Fetch one page of objects matching the query. Pages are restartable:
    /// pass the returned pagination token back to resume.
    async fn query(&self, query: Query, options: QueryOptions) -> Result<QueryResult>;

    /// Persist an object. With `options.etag` set, fails with `ETagMismatch`
    /// when the stored tag differs; without it, overwrites unconditionally.
    /// On success the fresh tag is written into `object.metadata.etag`.
    async fn save(&self, object: &mut Object, options: SaveOptions) -> Result<()>;

    /// Remove an object, with the same tag-conditional semantics as `save`.
    /// Fails with `NotFound` if the id does not exist.
    async fn delete(&self, id: &str, options: DeleteOptions) -> Result<()>;
}
