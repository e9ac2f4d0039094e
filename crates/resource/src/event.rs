//! Normalized change events
//!
//! Events are what the watch adapter publishes on its output channel. Every
//! variant except `FullSync` carries the revision it refers to; `FullSync`
//! marks the end of the initial listing and names no resource.

use crate::key::VersionedKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized change to a watched resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Event {
    /// The resource was created
    Added(VersionedKey),

    /// The resource changed
    Updated(VersionedKey),

    /// The resource was removed; the version is the last one observed
    Deleted(VersionedKey),

    /// The initial listing completed; later events are incremental
    FullSync,
}

/// Discriminator of an [`Event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// See [`Event::Added`]
    Added,
    /// See [`Event::Updated`]
    Updated,
    /// See [`Event::Deleted`]
    Deleted,
    /// See [`Event::FullSync`]
    FullSync,
}

impl Event {
    /// The event's kind
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Added(_) => EventKind::Added,
            Event::Updated(_) => EventKind::Updated,
            Event::Deleted(_) => EventKind::Deleted,
            Event::FullSync => EventKind::FullSync,
        }
    }

    /// The revision the event refers to, `None` for `FullSync`
    pub fn id(&self) -> Option<&VersionedKey> {
        match self {
            Event::Added(id) | Event::Updated(id) | Event::Deleted(id) => Some(id),
            Event::FullSync => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Added => "Added",
            EventKind::Updated => "Updated",
            EventKind::Deleted => "Deleted",
            EventKind::FullSync => "FullSync",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "[{}] {}", self.kind(), id),
            None => write!(f, "[{}]", self.kind()),
        }
    }
}
