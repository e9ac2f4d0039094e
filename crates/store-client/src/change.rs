//! Raw change notifications
//!
//! These are what a subscription pushes into its sink, before the watch
//! adapter normalizes them into events.

use std::fmt;

/// Kind of change reported by the watch subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeType {
    /// A resource appeared
    Add,
    /// A known resource changed or was re-announced
    Update,
    /// A resource was removed
    Delete,
    /// The initial listing completed; not tied to any resource
    FullSync,
    /// A notification kind this crate does not model. Carried through
    /// untouched so consumers can report it.
    Other(String),
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Add => f.write_str("Add"),
            ChangeType::Update => f.write_str("Update"),
            ChangeType::Delete => f.write_str("Delete"),
            ChangeType::FullSync => f.write_str("FullSync"),
            ChangeType::Other(kind) => write!(f, "Other({})", kind),
        }
    }
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeInfo {
    /// What happened
    pub change_type: ChangeType,

    /// Namespace-qualified name (`"<namespace>/<name>"`); empty for `FullSync`
    pub name: String,

    /// Store version of the object; empty for `FullSync`
    pub version: String,
}

impl ChangeInfo {
    /// Notification for a named resource
    pub fn new(change_type: ChangeType, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            change_type,
            name: name.into(),
            version: version.into(),
        }
    }

    /// The end-of-initial-listing marker
    pub fn full_sync() -> Self {
        Self::new(ChangeType::FullSync, "", "")
    }
}

impl fmt::Display for ChangeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} @{}", self.change_type, self.name, self.version)
    }
}
