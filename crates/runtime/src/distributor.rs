//! Snapshot distribution

use crate::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Receives every snapshot the processor publishes.
pub trait Distributor<T>: Send + Sync {
    /// Publish a new snapshot, replacing the previous one
    fn distribute(&self, snapshot: Arc<Snapshot<T>>);
}

/// Keeps the latest snapshot in memory and notifies watchers on change.
#[derive(Debug)]
pub struct InMemoryDistributor<T> {
    tx: watch::Sender<Option<Arc<Snapshot<T>>>>,
}

impl<T> Default for InMemoryDistributor<T> {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl<T> InMemoryDistributor<T> {
    /// Distributor with no snapshot yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, `None` until the first one is published
    pub fn current(&self) -> Option<Arc<Snapshot<T>>> {
        self.tx.borrow().clone()
    }

    /// Watch for newly published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot<T>>>> {
        self.tx.subscribe()
    }
}

impl<T: Send + Sync> Distributor<T> for InMemoryDistributor<T> {
    fn distribute(&self, snapshot: Arc<Snapshot<T>>) {
        info!(
            "Publishing snapshot {} ({} entries)",
            snapshot.version,
            snapshot.len()
        );
        self.tx.send_replace(Some(snapshot));
    }
}
