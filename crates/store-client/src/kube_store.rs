//! Kubernetes-backed resource store
//!
//! Watches a resource type through `kube_runtime::watcher` and turns its
//! Apply/Delete/Init/InitApply/InitDone stream into Add/Update/Delete/FullSync
//! notifications. The watcher relists on its own after connection loss; the
//! `RelistTracker` remembers what was announced so that relists become
//! incremental changes and `FullSync` is announced only once.

use crate::change::{ChangeInfo, ChangeType};
use crate::convert;
use crate::error::StoreError;
use crate::store_trait::{ChangeSink, StoreClient, Subscription};
use futures::StreamExt;
use kube::api::{Api, ListParams};
use kube::core::DynamicObject;
use kube::Client;
use kube_runtime::{watcher, WatchStreamExt};
use resource::ResourceSpec;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Store client talking to the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStoreClient {
    client: Client,
    namespace: Option<String>,
}

impl KubeStoreClient {
    /// Create a client
    ///
    /// # Arguments
    /// * `client` - Kubernetes client
    /// * `namespace` - Restrict watches to one namespace (`None` watches all)
    pub fn new(client: Client, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }

    /// Create a client from the ambient kubeconfig / in-cluster config
    pub async fn try_default(namespace: Option<String>) -> Result<Self, StoreError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, namespace))
    }

    fn api(&self, spec: &ResourceSpec, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = spec.api_resource();
        match (spec.namespaced, namespace) {
            (true, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait::async_trait]
impl StoreClient for KubeStoreClient {
    fn subscribe(
        &self,
        spec: &ResourceSpec,
        resync: Duration,
        sink: ChangeSink,
    ) -> Result<Box<dyn Subscription>, StoreError> {
        let api = self.api(spec, self.namespace.as_deref());
        Ok(Box::new(KubeSubscription {
            api,
            spec: spec.clone(),
            resync,
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
        debug!("Reading {} {}/{}", spec.kind, namespace, name);
        self.api(spec, Some(namespace))
            .get_opt(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{} {}/{}", spec.kind, namespace, name)))
    }
}

/// Subscription driving one `kube_runtime` watcher.
pub struct KubeSubscription {
    api: Api<DynamicObject>,
    spec: ResourceSpec,
    resync: Duration,
    sink: Option<ChangeSink>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl Subscription for KubeSubscription {
    async fn start(&mut self) -> Result<(), StoreError> {
        let sink = self.sink.take().ok_or_else(|| {
            StoreError::Subscription(format!("{} subscription already started", self.spec.kind))
        })?;

        // Fail fast when the API server is unreachable or the kind is not served
        if let Err(e) = self.api.list(&ListParams::default().limit(1)).await {
            self.sink = Some(sink);
            return Err(e.into());
        }

        info!("Starting {} watch", self.spec.kind);
        self.task = Some(tokio::spawn(run_watch(
            self.api.clone(),
            self.spec.clone(),
            self.resync,
            sink,
            self.cancel.clone(),
        )));
        Ok(())
    }

    async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("{} watch task panicked: {}", self.spec.kind, e);
            }
            info!("{} watch stopped", self.spec.kind);
        }
    }
}

async fn tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Ticker for periodic resync; `None` when disabled or out of range
fn resync_interval(spec: &ResourceSpec, resync: Duration) -> Option<Interval> {
    if resync.is_zero() {
        return None;
    }
    match Instant::now().checked_add(resync) {
        Some(start) => Some(tokio::time::interval_at(start, resync)),
        None => {
            warn!("{} resync period {:?} is out of range, resync disabled", spec.kind, resync);
            None
        }
    }
}

async fn run_watch(
    api: Api<DynamicObject>,
    spec: ResourceSpec,
    resync: Duration,
    sink: ChangeSink,
    cancel: CancellationToken,
) {
    let mut stream = Box::pin(watcher(api, watcher::Config::default()).default_backoff());
    let mut tracker = RelistTracker::default();
    let mut resync_timer = resync_interval(&spec, resync);

    loop {
        let changes = tokio::select! {
            () = cancel.cancelled() => break,
            () = tick(&mut resync_timer) => tracker.resync(),
            item = stream.next() => match item {
                Some(Ok(event)) => tracker.observe(Observation::from_event(event)),
                Some(Err(e)) => {
                    warn!("{} watch error (retrying): {}", spec.kind, e);
                    continue;
                }
                None => {
                    warn!("{} watch stream ended", spec.kind);
                    break;
                }
            },
        };

        for change in changes {
            tokio::select! {
                () = cancel.cancelled() => return,
                sent = sink.send(change) => {
                    if sent.is_err() {
                        debug!("{} notification sink closed", spec.kind);
                        return;
                    }
                }
            }
        }
    }
}

/// Watcher event reduced to what the tracker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Observation {
    Apply { name: String, version: String },
    Delete { name: String, version: String },
    Init,
    InitApply { name: String, version: String },
    InitDone,
}

impl Observation {
    fn from_event(event: watcher::Event<DynamicObject>) -> Self {
        match event {
            watcher::Event::Apply(obj) => Observation::Apply {
                name: convert::full_name(&obj),
                version: convert::version(&obj),
            },
            watcher::Event::Delete(obj) => Observation::Delete {
                name: convert::full_name(&obj),
                version: convert::version(&obj),
            },
            watcher::Event::Init => Observation::Init,
            watcher::Event::InitApply(obj) => Observation::InitApply {
                name: convert::full_name(&obj),
                version: convert::version(&obj),
            },
            watcher::Event::InitDone => Observation::InitDone,
        }
    }
}

/// Known-object bookkeeping across watch restarts.
#[derive(Debug, Default)]
pub(crate) struct RelistTracker {
    known: HashMap<String, String>,
    /// Names listed so far in the relist in progress
    relisting: Option<HashSet<String>>,
    synced: bool,
}

impl RelistTracker {
    pub(crate) fn observe(&mut self, observation: Observation) -> Vec<ChangeInfo> {
        match observation {
            Observation::Apply { name, version } => vec![self.upsert(name, version)],
            Observation::Delete { name, version } => {
                self.known.remove(&name);
                vec![ChangeInfo::new(ChangeType::Delete, name, version)]
            }
            Observation::Init => {
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            Observation::InitApply { name, version } => {
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(name.clone());
                }
                if self.known.get(&name) == Some(&version) {
                    return Vec::new();
                }
                vec![self.upsert(name, version)]
            }
            Observation::InitDone => {
                let seen = self.relisting.take().unwrap_or_default();
                let mut gone: Vec<String> = self
                    .known
                    .keys()
                    .filter(|name| !seen.contains(*name))
                    .cloned()
                    .collect();
                gone.sort();

                let mut changes: Vec<ChangeInfo> = gone
                    .into_iter()
                    .filter_map(|name| {
                        let version = self.known.remove(&name)?;
                        Some(ChangeInfo::new(ChangeType::Delete, name, version))
                    })
                    .collect();

                if !self.synced {
                    self.synced = true;
                    changes.push(ChangeInfo::full_sync());
                }
                changes
            }
        }
    }

    /// Re-announce every known object as an update
    pub(crate) fn resync(&self) -> Vec<ChangeInfo> {
        if !self.synced {
            return Vec::new();
        }
        let mut names: Vec<(&String, &String)> = self.known.iter().collect();
        names.sort();
        names
            .into_iter()
            .map(|(name, version)| ChangeInfo::new(ChangeType::Update, name.clone(), version.clone()))
            .collect()
    }

    fn upsert(&mut self, name: String, version: String) -> ChangeInfo {
        let change_type = if self.known.insert(name.clone(), version.clone()).is_some() {
            ChangeType::Update
        } else {
            ChangeType::Add
        };
        ChangeInfo::new(change_type, name, version)
    }
}
