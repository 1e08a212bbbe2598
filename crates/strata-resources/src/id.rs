//! Parsing and accessors for hierarchical resource identifiers

use crate::error::{ResourceIdError, Result};
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const PLANES_SEGMENT: &str = "planes";
const PROVIDERS_SEGMENT: &str = "providers";

/// One `type/name` pair in the scope chain of a resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSegment {
    /// Scope type (e.g. "resourcegroups")
    pub scope_type: String,

    /// Scope name (e.g. "rg0")
    pub name: String,
}

/// A parsed, case-normalized resource identifier
///
/// Equality, ordering and hashing are defined on the normalized string form,
/// so two identifiers that differ only in casing compare equal.
#[derive(Debug, Clone)]
pub struct ResourceId {
    normalized: String,
    plane: ScopeSegment,
    scopes: Vec<ScopeSegment>,
    provider_namespace: String,
    type_name: String,
    name: String,
    // Byte offset of the end of the scope prefix within `normalized`.
    root_scope_len: usize,
}

impl ResourceId {
    /// Parse a resource identifier string.
    ///
    /// The input is lowercased before parsing; the resulting identifier
    /// renders the normalized form and re-parses to an equal value.
    pub fn parse(raw: &str) -> Result<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let trimmed = lowered.strip_suffix('/').unwrap_or(&lowered);

        let rest = trimmed
            .strip_prefix('/')
            .ok_or_else(|| ResourceIdError::MalformedId(raw.to_string()))?;

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() < 7 {
            return Err(ResourceIdError::MalformedId(raw.to_string()));
        }

        for segment in &segments {
            validate_segment(raw, segment)?;
        }

        if segments[0] != PLANES_SEGMENT {
            return Err(ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: format!("expected '/{PLANES_SEGMENT}/' prefix"),
            });
        }

        let plane = ScopeSegment {
            scope_type: segments[1].to_string(),
            name: segments[2].to_string(),
        };

        let providers_at = segments
            .iter()
            .position(|s| *s == PROVIDERS_SEGMENT)
            .ok_or_else(|| ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: format!("missing '{PROVIDERS_SEGMENT}' segment"),
            })?;
        // The plane pair must sit wholly before the providers sentinel.
        if providers_at < 3 {
            return Err(ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: "missing plane designator".to_string(),
            });
        }

        // Scope chain sits between the plane pair and the providers sentinel,
        // and must consist of whole type/name pairs.
        let scope_segments = &segments[3..providers_at];
        if scope_segments.len() % 2 != 0 {
            return Err(ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: "unbalanced scope segments".to_string(),
            });
        }
        let scopes: Vec<ScopeSegment> = scope_segments
            .chunks(2)
            .map(|pair| ScopeSegment {
                scope_type: pair[0].to_string(),
                name: pair[1].to_string(),
            })
            .collect();

        // The terminal part is exactly namespace/type/name.
        let tail = &segments[providers_at + 1..];
        let [namespace, type_name, name] = tail else {
            return Err(ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: format!("expected {PROVIDERS_SEGMENT}/namespace/type/name suffix"),
            });
        };
        if !namespace.contains('.') {
            return Err(ResourceIdError::InvalidSegment {
                id: raw.to_string(),
                reason: format!("provider namespace '{namespace}' is missing a '.' qualifier"),
            });
        }

        let mut normalized = format!("/{PLANES_SEGMENT}/{}/{}", plane.scope_type, plane.name);
        for scope in &scopes {
            normalized.push_str(&format!("/{}/{}", scope.scope_type, scope.name));
        }
        let root_scope_len = normalized.len();
        normalized.push_str(&format!("/{PROVIDERS_SEGMENT}/{namespace}/{type_name}/{name}"));

        Ok(Self {
            normalized,
            plane,
            scopes,
            provider_namespace: namespace.to_string(),
            type_name: type_name.to_string(),
            name: name.to_string(),
            root_scope_len,
        })
    }

    /// Plane designator (the leading type/name pair)
    pub fn plane(&self) -> &ScopeSegment {
        &self.plane
    }

    /// Scope chain between the plane and the provider part
    pub fn scopes(&self) -> &[ScopeSegment] {
        &self.scopes
    }

    /// Name bound to a scope type, or `None` if the scope is absent.
    ///
    /// Lookup is case-insensitive and does not assume a fixed depth, so
    /// routing keys can be extracted without knowing the full chain shape.
    pub fn find_scope(&self, scope_type: &str) -> Option<&str> {
        let wanted = scope_type.to_ascii_lowercase();
        self.scopes
            .iter()
            .find(|s| s.scope_type == wanted)
            .map(|s| s.name.as_str())
    }

    /// Provider namespace (e.g. "applications.core")
    pub fn provider_namespace(&self) -> &str {
        &self.provider_namespace
    }

    /// Unqualified type name (e.g. "containers")
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Qualified resource type, the routing key for renderer lookup
    /// (e.g. "applications.core/containers")
    pub fn resource_type(&self) -> String {
        format!("{}/{}", self.provider_namespace, self.type_name)
    }

    /// Resource name (the last segment)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope prefix of the identifier, up to but excluding the provider part
    /// (e.g. "/planes/radius/local/resourcegroups/rg0")
    pub fn root_scope(&self) -> &str {
        &self.normalized[..self.root_scope_len]
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(ResourceIdError::InvalidSegment {
            id: raw.to_string(),
            reason: "empty segment".to_string(),
        });
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ResourceIdError::InvalidSegment {
            id: raw.to_string(),
            reason: format!("invalid characters in segment '{segment}'"),
        });
    }
    Ok(())
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ResourceId {}

impl std::hash::Hash for ResourceId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normalized)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ResourceId::parse(&raw).map_err(de::Error::custom)
    }
}
