//! Change notification translation

use resource::{Event, ResourceKey, ResourceKind, Version, VersionedKey};
use store_client::{ChangeInfo, ChangeType};
use tracing::{error, trace};

/// Translate one store notification into a normalized event.
///
/// Notification kinds outside Add/Update/Delete/FullSync are logged and
/// dropped (`None`); a malformed notification never stops the stream.
pub fn translate(kind: &ResourceKind, change: &ChangeInfo) -> Option<Event> {
    let id = || {
        VersionedKey::new(
            ResourceKey::new(kind.clone(), change.name.as_str()),
            Version::new(change.version.as_str()),
        )
    };

    let event = match &change.change_type {
        ChangeType::Add => Event::Added(id()),
        ChangeType::Update => Event::Updated(id()),
        ChangeType::Delete => Event::Deleted(id()),
        ChangeType::FullSync => Event::FullSync,
        ChangeType::Other(other) => {
            error!("Unknown change kind {:?} for {} {}", other, kind, change.name);
            return None;
        }
    };

    trace!("Dispatching source event: {}", event);
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind() -> ResourceKind {
        ResourceKind::new("ProducerService")
    }

    fn versioned(name: &str, version: &str) -> VersionedKey {
        VersionedKey::new(ResourceKey::new(kind(), name), Version::from(version))
    }

    #[test]
    fn test_add_becomes_added() {
        let change = ChangeInfo::new(ChangeType::Add, "ns1/svc-a", "v1");
        assert_eq!(
            translate(&kind(), &change),
            Some(Event::Added(versioned("ns1/svc-a", "v1")))
        );
    }

    #[test]
    fn test_update_and_delete() {
        let update = ChangeInfo::new(ChangeType::Update, "ns1/svc-a", "v2");
        let delete = ChangeInfo::new(ChangeType::Delete, "ns1/svc-a", "v3");
        assert_eq!(
            translate(&kind(), &update),
            Some(Event::Updated(versioned("ns1/svc-a", "v2")))
        );
        assert_eq!(
            translate(&kind(), &delete),
            Some(Event::Deleted(versioned("ns1/svc-a", "v3")))
        );
    }

    #[test]
    fn test_full_sync_carries_no_id() {
        let event = translate(&kind(), &ChangeInfo::full_sync()).unwrap();
        assert_eq!(event, Event::FullSync);
        assert_eq!(event.id(), None);
    }

    #[test]
    fn test_unknown_kind_is_dropped() {
        let change = ChangeInfo::new(ChangeType::Other("Bookmark".to_string()), "ns1/svc-a", "v9");
        assert_eq!(translate(&kind(), &change), None);
    }

    #[test]
    fn test_order_and_length_preserved_modulo_unknown() {
        let changes = vec![
            ChangeInfo::new(ChangeType::Add, "ns1/a", "1"),
            ChangeInfo::new(ChangeType::Other("?".to_string()), "ns1/a", "2"),
            ChangeInfo::new(ChangeType::Update, "ns1/a", "3"),
            ChangeInfo::full_sync(),
            ChangeInfo::new(ChangeType::Delete, "ns1/a", "4"),
        ];
        let events: Vec<Event> = changes.iter().filter_map(|c| translate(&kind(), c)).collect();
        assert_eq!(
            events,
            vec![
                Event::Added(versioned("ns1/a", "1")),
                Event::Updated(versioned("ns1/a", "3")),
                Event::FullSync,
                Event::Deleted(versioned("ns1/a", "4")),
            ]
        );
    }
}
