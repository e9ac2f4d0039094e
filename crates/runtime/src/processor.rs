//! Event processor
//!
//! Pulls events from a [`Source`], folds them into a [`State`] and publishes
//! a snapshot to the [`Distributor`] whenever the synced state changes.
//!
//! Added/Updated events only name a revision, so the processor reads the
//! entry back through `Source::get`. A read that finds nothing means the
//! resource was deleted in the meantime.

use crate::distributor::Distributor;
use crate::error::{RuntimeError, SourceError};
use crate::snapshot::State;
use crate::source::Source;
use resource::{Event, ResourceKey};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Running {
    cancel: CancellationToken,
    /// Cancelled by the loop itself when it exits
    done: CancellationToken,
    task: JoinHandle<()>,
}

/// Drives one source into one distributor.
pub struct Processor<S: Source, D> {
    source: Arc<S>,
    distributor: Arc<D>,
    running: Mutex<Option<Running>>,
}

impl<S, D> Processor<S, D>
where
    S: Source + 'static,
    D: Distributor<S::Item> + 'static,
{
    /// Creates a new processor.
    pub fn new(source: Arc<S>, distributor: Arc<D>) -> Self {
        Self {
            source,
            distributor,
            running: Mutex::new(None),
        }
    }

    /// The source this processor consumes
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Starts the source and the processing loop.
    ///
    /// Fails if the source fails to start; nothing is left running then.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }

        info!("Starting processor");
        let events = self.source.start().await?;
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let task = tokio::spawn(process(
            Arc::clone(&self.source),
            Arc::clone(&self.distributor),
            events,
            cancel.clone(),
            done.clone(),
        ));
        *running = Some(Running { cancel, done, task });
        Ok(())
    }

    /// Stops consuming events, then stops the source.
    ///
    /// The processing loop is joined before the source is stopped, so no
    /// read or publish is in flight once the source goes down.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            debug!("Processor not running");
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.task.await {
            warn!("Processor task panicked: {}", e);
        }
        self.source.stop().await;
        info!("Processor stopped");
    }

    /// Waits until the processing loop exits on its own (source closed).
    ///
    /// Returns immediately if the processor is not running. Dropping the
    /// returned future leaves the loop untouched; `stop` still joins it.
    pub async fn wait(&self) {
        let done = match self.running.lock().await.as_ref() {
            Some(running) => running.done.clone(),
            None => return,
        };
        done.cancelled().await;
    }
}

async fn process<S, D>(
    source: Arc<S>,
    distributor: Arc<D>,
    mut events: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    done: CancellationToken,
) where
    S: Source,
    D: Distributor<S::Item>,
{
    // Signals `wait` on every exit path, panics included
    let _done = done.drop_guard();
    let mut state = State::new();
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            next = events.recv() => match next {
                Some(event) => event,
                None => {
                    debug!("Event channel closed");
                    break;
                }
            },
        };

        let changed = tokio::select! {
            () = cancel.cancelled() => break,
            changed = apply(&*source, &mut state, event) => changed,
        };

        if changed && state.is_synced() {
            distributor.distribute(Arc::new(state.snapshot()));
        }
    }
    debug!("Processing loop exited with {} entries", state.len());
}

async fn apply<S: Source>(source: &S, state: &mut State<S::Item>, event: Event) -> bool {
    debug!("Processing event: {}", event);
    match event {
        Event::Added(id) | Event::Updated(id) => refresh(source, state, id.key()).await,
        Event::Deleted(id) => state.remove(id.key()),
        Event::FullSync => {
            if !state.mark_synced() {
                warn!("Ignoring repeated full sync");
                return false;
            }
            info!("Source fully synced with {} entries", state.len());
            true
        }
    }
}

async fn refresh<S: Source>(source: &S, state: &mut State<S::Item>, key: &ResourceKey) -> bool {
    match source.get(key).await {
        Ok(entry) => state.upsert(entry),
        Err(SourceError::NotFound(_)) => {
            debug!("{} vanished before it could be read", key);
            state.remove(key)
        }
        Err(e) => {
            warn!("Failed to read {}: {}", key, e);
            false
        }
    }
}
