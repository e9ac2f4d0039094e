//! Event source interface

use crate::error::SourceError;
use resource::{Entry, Event, ResourceKey};
use tokio::sync::mpsc;

/// A stream of normalized events plus direct reads of the same resources.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Domain object carried by entries
    type Item: Clone + Send + Sync + 'static;

    /// Start producing events.
    ///
    /// The returned channel ends when the source is stopped.
    async fn start(&self) -> Result<mpsc::Receiver<Event>, SourceError>;

    /// Stop producing events.
    async fn stop(&self);

    /// Read the current state of one resource, bypassing the event stream.
    async fn get(&self, key: &ResourceKey) -> Result<Entry<Self::Item>, SourceError>;
}
