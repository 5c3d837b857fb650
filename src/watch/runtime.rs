//! Watch runtime: notify watcher, event router and per-kind producers

use super::events::{convert_event, ChangeEvent, ChangeKind, EventFilter};
use super::rules::EventRules;
use crate::config::WatchConfig;
use crate::error::ApiError;
use crate::store::PathStore;
use notify::{RecursiveMode, Watcher};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Producer side of the daemon
pub struct WatchRuntime {
    config: WatchConfig,
    store: Arc<PathStore>,
}

impl WatchRuntime {
    pub fn new(config: WatchConfig, store: Arc<PathStore>) -> Self {
        Self { config, store }
    }

    fn channel_capacity(&self) -> usize {
        self.config.buffer_size_kb.max(1)
    }

    /// Watch the configured directory until `cancel` fires.
    ///
    /// Raw notify events are routed to one producer task per enabled event
    /// kind; the tasks apply events to the store concurrently.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ApiError> {
        let directory = dunce::canonicalize(&self.config.directory).map_err(|e| {
            ApiError::WatchError(format!(
                "Failed to resolve watch directory {}: {}",
                self.config.directory.display(),
                e
            ))
        })?;

        let (raw_tx, mut raw_rx) = mpsc::channel(self.channel_capacity());
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if raw_tx.blocking_send(res).is_err() {
                debug!("Watch event dropped after shutdown");
            }
        })?;
        watcher.watch(&directory, RecursiveMode::Recursive)?;
        info!(directory = %directory.display(), "Watching directory");

        let rules = EventRules::new(
            Arc::clone(&self.store),
            EventFilter::from_config(&self.config),
            self.config.preload_enabled,
        );
        let (producers, mut tasks) = self.spawn_producers(&rules, &cancel);

        let heartbeat_period = Duration::from_secs(self.config.heartbeat_secs.max(1));
        let mut heartbeat =
            tokio::time::interval_at(tokio::time::Instant::now() + heartbeat_period, heartbeat_period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = heartbeat.tick() => info!("Watcher running"),
                raw = raw_rx.recv() => match raw {
                    Some(Ok(event)) => {
                        if let Some(change) = convert_event(event) {
                            route(&producers, change).await;
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "Watch error"),
                    None => {
                        error!("Watcher channel disconnected");
                        break;
                    }
                },
            }
        }

        drop(watcher);
        drop(producers);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Producer task ended abnormally");
            }
        }
        info!("Watcher stopped");
        Ok(())
    }

    fn spawn_producers(
        &self,
        rules: &EventRules,
        cancel: &CancellationToken,
    ) -> (HashMap<ChangeKind, mpsc::Sender<ChangeEvent>>, JoinSet<()>) {
        let mut senders = HashMap::new();
        let mut tasks = JoinSet::new();

        for kind in ChangeKind::ALL {
            if !kind.enabled_in(&self.config) {
                debug!(kind = kind.as_str(), "Event kind disabled");
                continue;
            }
            let (tx, rx) = mpsc::channel(self.channel_capacity());
            senders.insert(kind, tx);
            tasks.spawn(produce(kind, rx, rules.clone(), cancel.clone()));
        }
        (senders, tasks)
    }
}

async fn route(producers: &HashMap<ChangeKind, mpsc::Sender<ChangeEvent>>, event: ChangeEvent) {
    let kind = event.kind();
    if let Some(tx) = producers.get(&kind) {
        if tx.send(event).await.is_err() {
            warn!(kind = kind.as_str(), "Producer stopped, event dropped");
        }
    }
}

/// Apply events of one kind until the router closes the channel or the
/// gate wait is cancelled
pub async fn produce(
    kind: ChangeKind,
    mut events: mpsc::Receiver<ChangeEvent>,
    rules: EventRules,
    cancel: CancellationToken,
) {
    debug!(kind = kind.as_str(), "Producer started");
    while let Some(event) = events.recv().await {
        match rules.apply(&event, &cancel).await {
            Ok(()) => {}
            Err(ApiError::Cancelled) => break,
            Err(e) => warn!(kind = kind.as_str(), error = %e, "Failed to record event"),
        }
    }
    debug!(kind = kind.as_str(), "Producer stopped");
}
