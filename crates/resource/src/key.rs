//! Resource identity
//!
//! A `ResourceKey` names a logical resource independent of its revision.
//! A `VersionedKey` pins one observed revision of that resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator for the schema/type of a resource (e.g. `ProducerService`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(String);

impl ResourceKind {
    /// Create a kind from its name
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// The kind name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Opaque version token assigned by the external store.
///
/// Tokens are only ever compared for equality. The store owns versioning
/// semantics, so a token is never parsed or ordered here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Wrap a store-assigned token
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(version: &str) -> Self {
        Self::new(version)
    }
}

impl From<String> for Version {
    fn from(version: String) -> Self {
        Self(version)
    }
}

/// Identifies a logical resource: its kind plus its namespace-qualified name
/// (`"<namespace>/<name>"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceKey {
    kind: ResourceKind,
    full_name: String,
}

impl ResourceKey {
    /// Create a key from an already-qualified name
    pub fn new(kind: ResourceKind, full_name: impl Into<String>) -> Self {
        Self {
            kind,
            full_name: full_name.into(),
        }
    }

    /// Create a key from a namespace and a name
    ///
    /// Cluster-scoped resources use an empty namespace, giving `"/<name>"`.
    pub fn namespaced(kind: ResourceKind, namespace: &str, name: &str) -> Self {
        Self::new(kind, format!("{}/{}", namespace, name))
    }

    /// Kind of the resource
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Namespace-qualified name
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Split the full name into `(namespace, name)`.
    ///
    /// Returns `None` unless the name has exactly two `/`-separated segments
    /// and the name segment is non-empty.
    pub fn split(&self) -> Option<(&str, &str)> {
        let mut parts = self.full_name.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(namespace), Some(name), None) if !name.is_empty() => Some((namespace, name)),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.full_name)
    }
}

/// One observed revision of a resource.
///
/// The key never changes for a logical resource; only the version moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionedKey {
    key: ResourceKey,
    version: Version,
}

impl VersionedKey {
    /// Pin `key` at `version`
    pub fn new(key: ResourceKey, version: Version) -> Self {
        Self { key, version }
    }

    /// The revision-independent key
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// The observed version
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Same resource at a different version
    #[must_use]
    pub fn with_version(&self, version: Version) -> Self {
        Self {
            key: self.key.clone(),
            version,
        }
    }
}

impl fmt::Display for VersionedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.key, self.version)
    }
}
