//! Watch adapter
//!
//! Wraps a store subscription for one resource kind. `start` hands the
//! caller the receiving end of a bounded event channel, `stop` tears the
//! subscription down and closes that channel, and `get` reads one resource
//! back from the store.
//!
//! The output channel's sender is owned by a single delivery task. Once
//! `stop` returns that task is gone, so the consumer observes end-of-stream
//! and no late notification can reach a retired channel. A slow consumer
//! blocks the delivery task, which in turn blocks the subscription through
//! the bounded notification sink; nothing is dropped.

use crate::translate::translate;
use async_trait::async_trait;
use resource::{Entry, Event, ResourceKey, ResourceKind, ResourceSpec, Version, VersionedKey};
use runtime::{Source, SourceError};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use store_client::{convert, ChangeInfo, StoreClient, StoreError, Subscription};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Capacity of the output event channel unless configured otherwise
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of the sink between the subscription and the delivery task
const NOTIFICATION_BUFFER: usize = 64;

/// Lifecycle phase of a [`WatchSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never started
    Uninitialized,
    /// Subscribed and delivering events
    Running,
    /// `stop` is tearing the subscription down
    Draining,
    /// Stopped; may be started again
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Running {
    subscription: Box<dyn Subscription>,
    cancel: CancellationToken,
    delivery: JoinHandle<()>,
}

enum Lifecycle {
    Uninitialized,
    Running(Running),
    Draining,
    Stopped,
}

impl Lifecycle {
    fn phase(&self) -> Phase {
        match self {
            Lifecycle::Uninitialized => Phase::Uninitialized,
            Lifecycle::Running(_) => Phase::Running,
            Lifecycle::Draining => Phase::Draining,
            Lifecycle::Stopped => Phase::Stopped,
        }
    }
}

/// Event source backed by a [`StoreClient`] watch on one resource kind.
///
/// `T` is the domain type stored objects are converted to by `get`.
pub struct WatchSource<C, T> {
    client: Arc<C>,
    spec: ResourceSpec,
    resync: Duration,
    capacity: usize,
    lifecycle: Mutex<Lifecycle>,
    _item: PhantomData<fn() -> T>,
}

impl<C, T> WatchSource<C, T>
where
    C: StoreClient + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an adapter
    ///
    /// # Arguments
    /// * `client` - Store to subscribe to and read from
    /// * `spec` - Resource kind to watch
    /// * `resync` - Periodic re-announcement of known objects (`Duration::ZERO` disables it)
    pub fn new(client: Arc<C>, spec: ResourceSpec, resync: Duration) -> Self {
        Self {
            client,
            spec,
            resync,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
            _item: PhantomData,
        }
    }

    /// Override the output channel capacity (minimum 1)
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// The watched resource kind
    pub fn kind(&self) -> &ResourceKind {
        &self.spec.kind
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> Phase {
        self.lifecycle.lock().await.phase()
    }

    /// Subscribe to the store and return the event channel.
    ///
    /// On failure the adapter keeps its previous phase and may be started
    /// again later.
    pub async fn start(&self) -> Result<mpsc::Receiver<Event>, SourceError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if matches!(*lifecycle, Lifecycle::Running(_) | Lifecycle::Draining) {
            return Err(SourceError::AlreadyRunning);
        }

        info!("Starting {} source", self.spec.kind);
        let (sink, notifications) = mpsc::channel(NOTIFICATION_BUFFER);
        let mut subscription = self
            .client
            .subscribe(&self.spec, self.resync, sink)
            .map_err(|e| subscription_error(&self.spec.kind, e))?;
        subscription
            .start()
            .await
            .map_err(|e| subscription_error(&self.spec.kind, e))?;

        let (events_tx, events_rx) = mpsc::channel(self.capacity);
        let cancel = CancellationToken::new();
        let delivery = tokio::spawn(deliver(
            self.spec.kind.clone(),
            notifications,
            events_tx,
            cancel.clone(),
        ));

        *lifecycle = Lifecycle::Running(Running {
            subscription,
            cancel,
            delivery,
        });
        Ok(events_rx)
    }

    /// Stop the subscription and close the event channel.
    ///
    /// Events already buffered stay readable; the consumer then sees the end
    /// of the stream. A no-op unless running.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let running = match std::mem::replace(&mut *lifecycle, Lifecycle::Draining) {
            Lifecycle::Running(running) => running,
            other => {
                debug!("{} source is {}, nothing to stop", self.spec.kind, other.phase());
                *lifecycle = other;
                return;
            }
        };

        info!("Stopping {} source", self.spec.kind);
        let Running {
            mut subscription,
            cancel,
            delivery,
        } = running;

        // No notification is produced once the subscription has stopped
        subscription.stop().await;
        cancel.cancel();
        if let Err(e) = delivery.await {
            error!("{} delivery task panicked: {}", self.spec.kind, e);
        }

        *lifecycle = Lifecycle::Stopped;
        info!("{} source stopped", self.spec.kind);
    }

    /// Read the current revision of one resource from the store.
    ///
    /// Never touches the event channel.
    pub async fn get(&self, key: &ResourceKey) -> Result<Entry<T>, SourceError> {
        if key.kind() != &self.spec.kind {
            return Err(SourceError::NotFound(format!(
                "{} is not watched by the {} source",
                key, self.spec.kind
            )));
        }
        let (namespace, name) = key
            .split()
            .ok_or_else(|| SourceError::MalformedKey(key.full_name().to_string()))?;

        let obj = self
            .client
            .get(&self.spec, namespace, name)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(what) => SourceError::NotFound(what),
                other => SourceError::Store(other.to_string()),
            })?;

        let item = convert::to_domain::<T>(&obj).map_err(|e| {
            warn!("Failed to convert {}: {}", key, e);
            SourceError::ConversionFailed(e.to_string())
        })?;

        let id = VersionedKey::new(key.clone(), Version::from(convert::version(&obj)));
        debug!("Read {}", id);
        Ok(Entry::new(id, item))
    }
}

#[async_trait]
impl<C, T> Source for WatchSource<C, T>
where
    C: StoreClient + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn start(&self) -> Result<mpsc::Receiver<Event>, SourceError> {
        WatchSource::start(self).await
    }

    async fn stop(&self) {
        WatchSource::stop(self).await
    }

    async fn get(&self, key: &ResourceKey) -> Result<Entry<T>, SourceError> {
        WatchSource::get(self, key).await
    }
}

fn subscription_error(kind: &ResourceKind, e: StoreError) -> SourceError {
    error!("Failed to start {} subscription: {}", kind, e);
    SourceError::SubscriptionStart(e.to_string())
}

/// Translate notifications and push them onto the output channel, in order.
async fn deliver(
    kind: ResourceKind,
    mut notifications: mpsc::Receiver<ChangeInfo>,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let mut synced = false;
    loop {
        let change = tokio::select! {
            () = cancel.cancelled() => break,
            next = notifications.recv() => match next {
                Some(change) => change,
                None => {
                    debug!("{} notification sink closed", kind);
                    break;
                }
            },
        };

        let Some(event) = translate(&kind, &change) else {
            continue;
        };
        if event == Event::FullSync {
            if synced {
                warn!("Dropping repeated full sync for {}", kind);
                continue;
            }
            synced = true;
        }

        tokio::select! {
            () = cancel.cancelled() => {
                debug!("Discarding {} on stop", event);
                break;
            }
            permit = events.reserve() => match permit {
                Ok(permit) => permit.send(event),
                Err(_) => {
                    debug!("{} event consumer went away", kind);
                    break;
                }
            },
        }
    }
}
