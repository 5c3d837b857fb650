//! Dispatch worker
//!
//! Periodic consumer: drain both categories under the gate, prune the pair of
//! trees, then hand the surviving entries to the cache handler. A failed
//! cycle is logged and the worker moves on to the next interval; drained
//! entries are not put back.

use crate::config::{BeholderConfig, DispatchConfig};
use crate::error::ApiError;
use crate::provider::{create_handler, CacheHandler};
use crate::pruning::{create_pruner, Pruner};
use crate::store::{PathStore, PathTree, Snapshot};
use crate::types::Category;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Store keys removed by each drain
    pub refresh_taken: usize,
    pub preload_taken: usize,
    /// Entries handed to the handler after pruning
    pub refresh_sent: usize,
    pub preload_sent: usize,
    /// Handler verdicts; `None` when the call was not made
    pub refresh_ok: Option<bool>,
    pub preload_ok: Option<bool>,
    /// The cycle ended with an error
    pub failed: bool,
}

pub struct DispatchWorker {
    store: Arc<PathStore>,
    config: DispatchConfig,
    pruner: Box<dyn Pruner>,
    handler: Arc<dyn CacheHandler>,
}

impl DispatchWorker {
    pub fn new(
        store: Arc<PathStore>,
        config: DispatchConfig,
        pruner: Box<dyn Pruner>,
        handler: Arc<dyn CacheHandler>,
    ) -> Self {
        Self {
            store,
            config,
            pruner,
            handler,
        }
    }

    /// Worker with the pruner and handler named in the config
    pub fn from_config(store: Arc<PathStore>, config: &BeholderConfig) -> Result<Self, ApiError> {
        let pruner = create_pruner(&config.pruning)?;
        let handler: Arc<dyn CacheHandler> = Arc::from(create_handler(&config.handler)?);
        info!(
            pruner = pruner.name(),
            handler = handler.name(),
            "Dispatch worker configured"
        );
        Ok(Self::new(store, config.dispatch.clone(), pruner, handler))
    }

    /// Run cycles every `check_interval_secs` until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.config.check_interval_secs.max(1));
        info!(interval_secs = interval.as_secs(), "Dispatch worker started");

        while !cancel.is_cancelled() {
            let report = self.run_cycle(&cancel).await;
            debug!(?report, "Dispatch cycle finished");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }
        info!("Dispatch worker stopped");
    }

    /// One drain, prune and dispatch pass
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleReport {
        info!("Dispatch cycle running");
        let mut report = CycleReport::default();

        let refresh = self.drain(Category::Refresh, self.config.refresh_take_count, cancel);
        let preload = self.drain(Category::Preload, self.config.preload_take_count, cancel);
        report.refresh_taken = refresh.as_ref().map_or(0, |s| s.taken.len());
        report.preload_taken = preload.as_ref().map_or(0, |s| s.taken.len());

        if let Err(e) = self.process(refresh, preload, cancel, &mut report).await {
            report.failed = true;
            let contract = e
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_contract_violation);
            if contract {
                error!(error = %format!("{:#}", e), "Dispatch cycle hit a tree contract violation");
            } else {
                error!(error = %format!("{:#}", e), "Dispatch cycle failed");
            }
        }
        report
    }

    /// Block producers, materialize and clear one category, release
    fn drain(
        &self,
        category: Category,
        take_count: i64,
        cancel: &CancellationToken,
    ) -> Option<Snapshot> {
        if cancel.is_cancelled() {
            warn!(category = %category, "Drain cancelled");
            return None;
        }

        let guard = self.store.block();
        let snapshot = match self.store.snapshot_and_clear(category, take_count) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(category = %category, error = %e, "Tree contract violated while draining");
                None
            }
        };
        guard.release();

        info!(
            category = %category,
            taken = snapshot.as_ref().map_or(0, |s| s.taken.len()),
            "Drained store"
        );
        snapshot
    }

    async fn process(
        &self,
        refresh: Option<Snapshot>,
        preload: Option<Snapshot>,
        cancel: &CancellationToken,
        report: &mut CycleReport,
    ) -> anyhow::Result<()> {
        let has_refresh = refresh.is_some();
        let has_preload = preload.is_some();
        let mut refresh_tree = refresh.map_or_else(PathTree::empty, |s| s.tree);
        let mut preload_tree = preload.map_or_else(PathTree::empty, |s| s.tree);

        self.pruner
            .prune(&mut refresh_tree, &mut preload_tree)
            .context("Pruning trees failed")?;

        if has_refresh {
            let entries = refresh_tree.operations();
            report.refresh_sent = entries.len();
            match self.handler.refresh(&entries, cancel).await {
                Ok(ok) => {
                    report.refresh_ok = Some(ok);
                    if ok {
                        info!(count = entries.len(), "Refreshing trees completed");
                    } else {
                        warn!(count = entries.len(), "Refreshing trees reported failure");
                    }
                }
                Err(ApiError::Cancelled) => {
                    warn!("Processing trees cancelled during refresh");
                    return Ok(());
                }
                Err(e) => return Err(e).context("Refreshing trees failed"),
            }
        }

        if has_preload {
            let entries = preload_tree.operations();
            report.preload_sent = entries.len();
            match self.handler.preload(&entries, cancel).await {
                Ok(ok) => {
                    report.preload_ok = Some(ok);
                    if ok {
                        info!(count = entries.len(), "Preloading trees completed");
                    } else {
                        warn!(count = entries.len(), "Preloading trees reported failure");
                    }
                }
                Err(ApiError::Cancelled) => {
                    warn!("Processing trees cancelled during preload");
                }
                Err(e) => return Err(e).context("Preloading trees failed"),
            }
        }
        Ok(())
    }
}
