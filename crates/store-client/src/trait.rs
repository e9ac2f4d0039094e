//! StoreClient trait for mocking
//!
//! This trait abstracts the resource store so the watch adapter can run
//! against Kubernetes in production and against an in-memory mock in tests.

use crate::change::ChangeInfo;
use crate::error::StoreError;
use kube::core::DynamicObject;
use resource::ResourceSpec;
use std::time::Duration;
use tokio::sync::mpsc;

/// Bounded queue a subscription pushes its notifications into.
///
/// A full sink blocks the subscription, which is how a slow consumer slows
/// down the watch.
pub type ChangeSink = mpsc::Sender<ChangeInfo>;

/// Handle to a running (or not yet started) watch.
#[async_trait::async_trait]
pub trait Subscription: Send {
    /// Begin delivering notifications into the sink.
    ///
    /// Fails when the store cannot be reached. A subscription can be started
    /// at most once.
    async fn start(&mut self) -> Result<(), StoreError>;

    /// Stop delivering notifications.
    ///
    /// Returns only once the delivery task has exited: no notification is
    /// pushed into the sink after this resolves. Calling it on a subscription
    /// that never started is a no-op.
    async fn stop(&mut self);
}

/// Trait for resource store operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait StoreClient: Send + Sync {
    /// Create a subscription for `spec` that pushes into `sink`.
    ///
    /// `resync` re-announces every known object as an update on each tick;
    /// `Duration::ZERO` disables it.
    fn subscribe(
        &self,
        spec: &ResourceSpec,
        resync: Duration,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError>;

    /// Read one object directly from the store.
    async fn get(
        &self,
        spec: &ResourceSpec,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, StoreError>;
}
