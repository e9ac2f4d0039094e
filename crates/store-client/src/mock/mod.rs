//! Mock StoreClient for unit testing
//!
//! This module provides an in-memory implementation of `StoreClient` that can
//! be used in unit tests without a running API server.
//!
//! Objects added with `add_object` are served by `get`. Notifications queued
//! with `push_initial` are delivered, in order, by every subscription when it
//! starts; `notify` feeds live notifications to every running subscription.

use crate::change::ChangeInfo;
use crate::error::StoreError;
use crate::store_trait::{ChangeSink, StoreClient, Subscription};
use kube::core::DynamicObject;
use resource::ResourceSpec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

type ObjectKey = (String, String, String);

/// Mock StoreClient for testing
#[derive(Clone, Default)]
pub struct MockStoreClient {
    pub(crate) objects: Arc<Mutex<HashMap<ObjectKey, DynamicObject>>>,
    pub(crate) initial: Arc<Mutex<Vec<ChangeInfo>>>,
    pub(crate) feeds: Arc<Mutex<Vec<mpsc::UnboundedSender<ChangeInfo>>>>,
    pub(crate) fail_subscribe: Arc<AtomicBool>,
    pub(crate) fail_start: Arc<AtomicBool>,
    pub(crate) delivered: Arc<AtomicUsize>,
    pub(crate) active: Arc<AtomicUsize>,
    pub(crate) reads: Arc<AtomicUsize>,
}

impl MockStoreClient {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an object served by `get` (for test setup)
    pub fn add_object(
        &self,
        spec: &ResourceSpec,
        namespace: &str,
        name: &str,
        version: &str,
        data: serde_json::Value,
    ) {
        let ar = spec.api_resource();
        let mut obj = DynamicObject::new(name, &ar).data(data);
        if !namespace.is_empty() {
            obj = obj.within(namespace);
        }
        obj.metadata.resource_version = Some(version.to_string());
        self.objects.lock().unwrap().insert(
            (spec.kind.to_string(), namespace.to_string(), name.to_string()),
            obj,
        );
    }

    /// Remove an object (for test setup)
    pub fn remove_object(&self, spec: &ResourceSpec, namespace: &str, name: &str) {
        self.objects.lock().unwrap().remove(&(
            spec.kind.to_string(),
            namespace.to_string(),
            name.to_string(),
        ));
    }

    /// Queue notifications delivered by each subscription on start
    pub fn push_initial(&self, changes: impl IntoIterator<Item = ChangeInfo>) {
        self.initial.lock().unwrap().extend(changes);
    }

    /// Deliver a notification to every running subscription
    pub fn notify(&self, change: ChangeInfo) {
        self.feeds
            .lock()
            .unwrap()
            .retain(|feed| feed.send(change.clone()).is_ok());
    }

    /// Make `subscribe` fail
    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Make `Subscription::start` fail, as if the store were unreachable
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Notifications accepted by a sink so far, across all subscriptions
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Subscriptions whose delivery task is currently running
    pub fn active_subscriptions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Point reads served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StoreClient for MockStoreClient {
    fn subscribe(
        &self,
        spec: &ResourceSpec,
        _resync: Duration,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StoreError::Subscription(format!(
                "{} subscription refused",
                spec.kind
            )));
        }
        Ok(Box::new(MockSubscription {
            store: self.clone(),
            sink: Some(sink),
            cancel: CancellationToken::new(),
            task: None,
        }))
    }

    async fn get(
        &self,
        spec: &ResourceSpec,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(&(spec.kind.to_string(), namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{} {}/{}", spec.kind, namespace, name)))
    }
}

/// Subscription created by [`MockStoreClient`]
pub struct MockSubscription {
    store: MockStoreClient,
    sink: Option<ChangeSink>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl Subscription for MockSubscription {
    async fn start(&mut self) -> Result<(), StoreError> {
        if self.store.fail_start.load(Ordering::SeqCst) {
            return Err(StoreError::Subscription("store unreachable".to_string()));
        }
        let sink = self
            .sink
            .take()
            .ok_or_else(|| StoreError::Subscription("already started".to_string()))?;

        let initial = self.store.initial.lock().unwrap().clone();
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        self.store.feeds.lock().unwrap().push(feed_tx);

        let active = ActiveSubscription::enter(&self.store.active);
        let store = self.store.clone();
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(async move {
            let _active = active;
            deliver(&store, initial, feed_rx, sink, cancel).await;
        }));
        Ok(())
    }

    async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Mock delivery task panicked: {}", e);
            }
        }
    }
}

/// Counts a subscription as active until dropped, even by a panicking task
struct ActiveSubscription(Arc<AtomicUsize>);

impl ActiveSubscription {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn deliver(
    store: &MockStoreClient,
    initial: Vec<ChangeInfo>,
    mut feed: mpsc::UnboundedReceiver<ChangeInfo>,
    sink: ChangeSink,
    cancel: CancellationToken,
) {
    let mut pending = initial.into_iter();
    loop {
        let change = match pending.next() {
            Some(change) => change,
            None => tokio::select! {
                () = cancel.cancelled() => return,
                next = feed.recv() => match next {
                    Some(change) => change,
                    None => return,
                },
            },
        };

        tokio::select! {
            () = cancel.cancelled() => return,
            sent = sink.send(change) => {
                if sent.is_err() {
                    return;
                }
                store.delivered.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeType;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_returns_added_object() {
        let store = MockStoreClient::new();
        let spec = ResourceSpec::producer_service();
        store.add_object(&spec, "ns1", "svc-a", "7", json!({"spec": {"serviceName": "a"}}));

        let obj = store.get(&spec, "ns1", "svc-a").await.unwrap();
        assert_eq!(obj.metadata.resource_version.as_deref(), Some("7"));
        assert_eq!(obj.metadata.namespace.as_deref(), Some("ns1"));

        let missing = store.get(&spec, "ns1", "svc-b").await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_subscription_delivers_initial_then_live() {
        let store = MockStoreClient::new();
        let spec = ResourceSpec::producer_service();
        store.push_initial(vec![
            ChangeInfo::new(ChangeType::Add, "ns1/a", "1"),
            ChangeInfo::full_sync(),
        ]);

        let (tx, mut rx) = mpsc::channel(8);
        let mut subscription = store.subscribe(&spec, Duration::ZERO, tx).unwrap();
        subscription.start().await.unwrap();
        store.notify(ChangeInfo::new(ChangeType::Update, "ns1/a", "2"));

        assert_eq!(rx.recv().await.unwrap().change_type, ChangeType::Add);
        assert_eq!(rx.recv().await.unwrap().change_type, ChangeType::FullSync);
        assert_eq!(rx.recv().await.unwrap().version, "2");

        subscription.stop().await;
        assert_eq!(store.active_subscriptions(), 0);
        assert_eq!(store.delivered(), 3);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_start_failure() {
        let store = MockStoreClient::new();
        store.fail_start(true);
        let (tx, _rx) = mpsc::channel(1);
        let mut subscription = store
            .subscribe(&ResourceSpec::producer_service(), Duration::ZERO, tx)
            .unwrap();
        assert!(subscription.start().await.is_err());
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_active_count_released_when_delivery_panics() {
        let store = MockStoreClient::new();
        let active = ActiveSubscription::enter(&store.active);
        assert_eq!(store.active_subscriptions(), 1);

        let task = tokio::spawn(async move {
            let _active = active;
            panic!("delivery failed");
        });
        assert!(task.await.is_err());
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_active_count_released_when_sink_closes() {
        let store = MockStoreClient::new();
        store.push_initial(vec![ChangeInfo::new(ChangeType::Add, "ns1/a", "1")]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut subscription = store
            .subscribe(&ResourceSpec::producer_service(), Duration::ZERO, tx)
            .unwrap();
        subscription.start().await.unwrap();
        subscription.stop().await;
        assert_eq!(store.active_subscriptions(), 0);
        assert_eq!(store.delivered(), 0);
    }
}

