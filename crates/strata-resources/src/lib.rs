//! Resource identifier parsing for the Strata control plane.
//!
//! Every resource handled by the engine is addressed by a hierarchical,
//! case-normalized identifier:
//!
//! ```text
//! /planes/{planeType}/{planeName}[/{scopeType}/{scopeName}...]/providers/{namespace}/{type}/{name}
//! ```
//!
//! For example:
//!
//! ```text
//! /planes/radius/local/resourcegroups/rg0/providers/applications.core/containers/web
//! ```
//!
//! Identifiers are parsed once, normalized to lowercase, and compared on the
//! normalized string form. A valid identifier round-trips: parsing the output
//! of [`ResourceId::to_string`] yields an equal identifier.

pub mod error;
pub mod id;

pub use error::{ResourceIdError, Result};
pub use id::{ResourceId, ScopeSegment};
