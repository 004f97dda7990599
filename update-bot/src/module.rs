use crate::diff::difference;
use crate::snapshot::SnapshotStore;
use crate::source::{SourceFetcher, UpdateSource};
use crate::types::{Result, TickOutcome, UpdateError};
use async_trait::async_trait;
use chrono::Utc;
use interfaces::NotifierSink;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Reported by a module whose loop hit a fatal error (a snapshot that could
/// not be saved, a message that could not be delivered).
#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: UpdateError,
}

/// A long-running unit that can be switched on and off.
#[async_trait]
pub trait Module: Send {
    fn name(&self) -> String;

    fn is_enabled(&self) -> bool;

    /// Start the module. Does nothing if it is already running. A loop still
    /// finishing its last tick after `disable` is waited for; the first pull
    /// of the new loop never is.
    async fn enable(&mut self) -> Result<()>;

    /// Stop the module after the tick in progress, if any.
    fn disable(&mut self);

    /// Wait for the task stopped by the last `disable` to finish its tick.
    async fn wait_stopped(&mut self);
}

enum ModuleState {
    Disabled,
    Enabled {
        enabled_tx: watch::Sender<bool>,
        task: JoinHandle<()>,
    },
}

/// Polls one source, announces what is new and remembers what it saw.
///
/// At most one loop runs per module: a re-enable first waits for the loop
/// stopped by the previous `disable`.
pub struct UpdateModule<S: UpdateSource> {
    source: Arc<S>,
    sink: Arc<dyn NotifierSink>,
    store: SnapshotStore,
    poll_interval: Duration,
    failures: mpsc::UnboundedSender<ModuleFailure>,
    state: ModuleState,
    stopping: Option<JoinHandle<()>>,
}

impl<S: UpdateSource> UpdateModule<S> {
    pub fn new(
        source: S,
        sink: Arc<dyn NotifierSink>,
        store: SnapshotStore,
        poll_interval: Duration,
        failures: mpsc::UnboundedSender<ModuleFailure>,
    ) -> Self {
        Self {
            source: Arc::new(source),
            sink,
            store,
            poll_interval,
            failures,
            state: ModuleState::Disabled,
            stopping: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: UpdateSource> Module for UpdateModule<S> {
    fn name(&self) -> String {
        self.source.name()
    }

    /// False once the loop has exited, including after a fatal error.
    fn is_enabled(&self) -> bool {
        match &self.state {
            ModuleState::Enabled { task, .. } => !task.is_finished(),
            ModuleState::Disabled => false,
        }
    }

    async fn enable(&mut self) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        // A loop that ended on a fatal error still holds its state.
        if let ModuleState::Enabled { task, .. } =
            std::mem::replace(&mut self.state, ModuleState::Disabled)
        {
            self.stopping = Some(task);
        }
        self.wait_stopped().await;

        let task = UpdateTask::load(
            self.source.clone(),
            self.sink.clone(),
            self.store.clone(),
            self.poll_interval,
        )
        .await?;

        let (enabled_tx, enabled_rx) = watch::channel(true);
        let failures = self.failures.clone();
        let name = self.source.name();

        info!(
            "Enabling {} ({} items in snapshot, polling every {:?})",
            name,
            task.last_items().len(),
            self.poll_interval
        );

        let handle = tokio::spawn(async move {
            if let Err(error) = task.run(enabled_rx).await {
                error!("{} stopped on a fatal error: {}", name, error);
                let _ = failures.send(ModuleFailure {
                    module: name,
                    error,
                });
            }
        });

        self.state = ModuleState::Enabled {
            enabled_tx,
            task: handle,
        };
        Ok(())
    }

    fn disable(&mut self) {
        if let ModuleState::Enabled { enabled_tx, task } =
            std::mem::replace(&mut self.state, ModuleState::Disabled)
        {
            let _ = enabled_tx.send(false);
            self.stopping = Some(task);
            info!("Disabled {}", self.source.name());
        }
    }

    async fn wait_stopped(&mut self) {
        if let Some(task) = self.stopping.take() {
            if let Err(e) = task.await {
                warn!("{} update task ended abnormally: {}", self.source.name(), e);
            }
        }
    }
}

/// The per-module loop state: the last pull and whether the next successful
/// pull should be stored without announcing anything.
pub struct UpdateTask<S: UpdateSource> {
    source: Arc<S>,
    sink: Arc<dyn NotifierSink>,
    store: SnapshotStore,
    snapshot_path: PathBuf,
    poll_interval: Duration,
    last_items: Vec<S::Item>,
    suppress_next: bool,
}

impl<S: UpdateSource> UpdateTask<S> {
    /// Read the persisted snapshot. A source without one (or with an empty
    /// one) gets its first successful pull stored silently, so a fresh
    /// install does not replay the whole feed history.
    pub async fn load(
        source: Arc<S>,
        sink: Arc<dyn NotifierSink>,
        store: SnapshotStore,
        poll_interval: Duration,
    ) -> Result<Self> {
        let snapshot_path = store.locate(&source.snapshot_location());
        let last_items = store
            .load::<S::Item>(&snapshot_path)
            .await?
            .unwrap_or_default();
        let suppress_next = last_items.is_empty();

        Ok(Self {
            source,
            sink,
            store,
            snapshot_path,
            poll_interval,
            last_items,
            suppress_next,
        })
    }

    pub fn last_items(&self) -> &[S::Item] {
        &self.last_items
    }

    /// Poll until `enabled` turns false or its sender goes away.
    ///
    /// Returns an error only for failures that must stop the process; fetch
    /// errors are logged and retried on the next tick.
    pub async fn run(mut self, mut enabled: watch::Receiver<bool>) -> Result<()> {
        let name = self.source.name();

        while *enabled.borrow_and_update() {
            let outcome = self.tick().await?;
            debug!("{} tick finished: {:?}", name, outcome);

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = enabled.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("{} update loop exited", name);
        Ok(())
    }

    /// One fetch, diff, dispatch and persist cycle.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let name = self.source.name();

        let pulled = match self.source.fetcher().fetch().await {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to pull items for {}: {}", name, e);
                return Ok(TickOutcome::FetchFailed);
            }
        };

        let outcome = if self.suppress_next {
            self.suppress_next = false;
            info!(
                "First pull for {} stored without posting ({} items)",
                name,
                pulled.len()
            );
            TickOutcome::Suppressed {
                pulled: pulled.len(),
            }
        } else {
            let new_items = difference(&self.last_items, &pulled, self.source.equality());
            let new_count = new_items.len();
            let recent = self.source.retain_recent(new_items, Utc::now());
            debug!(
                "{}: {} pulled, {} new, {} recent",
                name,
                pulled.len(),
                new_count,
                recent.len()
            );

            if recent.is_empty() {
                TickOutcome::NoChanges {
                    pulled: pulled.len(),
                }
            } else {
                let messages = self.post_updates(&recent).await?;
                TickOutcome::Dispatched {
                    items: recent.len(),
                    messages,
                }
            }
        };

        self.store.save(&self.snapshot_path, &pulled).await?;
        self.last_items = pulled;

        Ok(outcome)
    }

    async fn post_updates(&self, items: &[S::Item]) -> Result<usize> {
        let messages = self.source.format(items)?;
        let channel = self.source.channel();

        for message in &messages {
            let id = self
                .sink
                .send(channel, message)
                .await
                .map_err(|source| UpdateError::Delivery { channel, source })?;

            self.sink
                .publish(channel, &id)
                .await
                .map_err(|source| UpdateError::Delivery { channel, source })?;
        }

        info!(
            "Posted {} messages for {} new items from {} to channel {}",
            messages.len(),
            items.len(),
            self.source.name(),
            channel
        );
        Ok(messages.len())
    }
}
