//! Materialized resource snapshots

use crate::key::VersionedKey;
use serde::{Deserialize, Serialize};

/// A resource at one version, with its converted domain object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    /// Which resource and which revision of it
    pub id: VersionedKey,

    /// Domain object produced by the conversion layer
    pub item: T,
}

impl<T> Entry<T> {
    /// Create an entry
    pub fn new(id: VersionedKey, item: T) -> Self {
        Self { id, item }
    }
}
