//! Server composition.
//!
//! Wires a watch source into the processor and an in-memory distributor.
//! Starting the server starts the source; stopping it stops consuming events
//! first and then stops the source.

use crate::config::Config;
use crate::error::ControllerError;
use runtime::{InMemoryDistributor, Processor};
use serde::de::DeserializeOwned;
use source::WatchSource;
use std::sync::Arc;
use store_client::StoreClient;
use tracing::info;

/// Galley server for one watched resource kind.
pub struct Server<C, T>
where
    C: StoreClient + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    processor: Processor<WatchSource<C, T>, InMemoryDistributor<T>>,
    distributor: Arc<InMemoryDistributor<T>>,
}

impl<C, T> Server<C, T>
where
    C: StoreClient + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a server from an already built source and distributor.
    pub fn new(source: Arc<WatchSource<C, T>>, distributor: Arc<InMemoryDistributor<T>>) -> Self {
        let processor = Processor::new(source, Arc::clone(&distributor));
        Self {
            processor,
            distributor,
        }
    }

    /// Builds the default pipeline for the configured resource kind.
    pub fn from_config(client: Arc<C>, config: &Config) -> Self {
        let source = WatchSource::new(client, config.resource.clone(), config.resync);
        Self::new(Arc::new(source), Arc::new(InMemoryDistributor::new()))
    }

    /// Distributor receiving the published snapshots
    pub fn distributor(&self) -> &Arc<InMemoryDistributor<T>> {
        &self.distributor
    }

    /// Starts the source and the processing loop.
    pub async fn start(&self) -> Result<(), ControllerError> {
        info!("Starting Galley server for {}", self.processor.source().kind());
        self.processor.start().await?;
        Ok(())
    }

    /// Stops consuming events, then stops the source.
    pub async fn stop(&self) {
        info!("Stopping Galley server");
        self.processor.stop().await;
    }

    /// Runs until the event stream ends.
    ///
    /// The stream only ends on its own when the watch gives up, which is
    /// reported as an error.
    pub async fn run(&self) -> Result<(), ControllerError> {
        self.processor.wait().await;
        Err(ControllerError::Server(format!(
            "{} event stream ended",
            self.processor.source().kind()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use resource::{ProducerServiceSpec, ResourceKey, ResourceKind, ResourceSpec};
    use runtime::{RuntimeError, Snapshot};
    use serde_json::json;
    use std::time::Duration;
    use store_client::{ChangeInfo, ChangeType, MockStoreClient};
    use tokio::sync::watch;

    fn config() -> Config {
        Config {
            namespace: None,
            resync: Duration::ZERO,
            resource: ResourceSpec::producer_service(),
            log_format: LogFormat::Text,
        }
    }

    async fn next_snapshot<T>(
        rx: &mut watch::Receiver<Option<Arc<Snapshot<T>>>>,
    ) -> Arc<Snapshot<T>> {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("timed out waiting for snapshot")
            .unwrap();
        rx.borrow_and_update().clone().unwrap()
    }

    #[tokio::test]
    async fn test_publishes_store_contents_after_full_sync() {
        let store = MockStoreClient::new();
        let spec = ResourceSpec::producer_service();
        store.add_object(&spec, "ns1", "svc-a", "3", json!({"spec": {"serviceName": "billing"}}));
        store.push_initial(vec![
            ChangeInfo::new(ChangeType::Add, "ns1/svc-a", "3"),
            ChangeInfo::full_sync(),
        ]);

        let server: Server<_, ProducerServiceSpec> =
            Server::from_config(Arc::new(store.clone()), &config());
        let mut snapshots = server.distributor().subscribe();
        server.start().await.unwrap();

        let snapshot = next_snapshot(&mut snapshots).await;
        let key = ResourceKey::new(ResourceKind::new("ProducerService"), "ns1/svc-a");
        let entry = snapshot.get(&key).unwrap();
        assert_eq!(entry.item.service_name, "billing");
        assert_eq!(entry.id.version().as_str(), "3");

        store.remove_object(&spec, "ns1", "svc-a");
        store.notify(ChangeInfo::new(ChangeType::Delete, "ns1/svc-a", "4"));
        assert!(next_snapshot(&mut snapshots).await.is_empty());

        server.stop().await;
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_start_fails_when_subscription_fails() {
        let store = MockStoreClient::new();
        store.fail_start(true);
        let server: Server<_, serde_json::Value> =
            Server::from_config(Arc::new(store.clone()), &config());

        let result = server.start().await;
        assert!(matches!(result, Err(ControllerError::Runtime(RuntimeError::Source(_)))));
        assert!(server.distributor().current().is_none());

        // Recovers once the store is reachable
        store.fail_start(false);
        server.start().await.unwrap();
        server.stop().await;
    }

    #[tokio::test]
    async fn test_run_reports_end_of_stream() {
        let store = MockStoreClient::new();
        let server: Server<_, serde_json::Value> =
            Server::from_config(Arc::new(store.clone()), &config());
        server.start().await.unwrap();

        // Stopping the source from underneath ends the stream
        server.processor.source().stop().await;
        let result = tokio::time::timeout(Duration::from_secs(5), server.run())
            .await
            .expect("run did not return");
        assert!(matches!(result, Err(ControllerError::Server(_))));
        server.stop().await;
    }
}
