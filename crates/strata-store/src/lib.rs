//! Strata document store abstraction
//!
//! This crate defines the persistence contract the rest of the control plane
//! relies on: a key/document store with `Get`/`Query`/`Save`/`Delete`
//! operations and optimistic concurrency via entity tags.
//!
//! Writers never take locks across long-running work. A caller captures the
//! entity tag at `Get` time, performs its (possibly slow) processing, and
//! presents the tag again at `Save`. If another writer got there first the
//! store reports [`StoreError::ETagMismatch`] and the caller reloads and
//! retries; lost updates are detected, not prevented.
//!
//! [`InMemoryStore`] is the bundled implementation, used by the daemon and by
//! tests. Production deployments implement [`StoreClient`] against a real
//! database.

pub mod client;
pub mod error;
pub mod memory;
pub mod object;
pub mod options;
pub mod query;

pub use client::StoreClient;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use object::{ETag, Metadata, Object};
pub use options::{DeleteOptions, GetOptions, QueryOptions, SaveOptions, DEFAULT_QUERY_PAGE_SIZE};
pub use query::{Query, QueryFilter, QueryResult};
