//! Daemon wiring: one store shared by the watch runtime and the dispatch worker

use crate::config::BeholderConfig;
use crate::dispatch::DispatchWorker;
use crate::error::ApiError;
use crate::store::PathStore;
use crate::watch::WatchRuntime;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct Daemon {
    config: BeholderConfig,
    store: Arc<PathStore>,
}

impl Daemon {
    pub fn new(config: BeholderConfig) -> Self {
        Self {
            config,
            store: Arc::new(PathStore::new()),
        }
    }

    pub fn store(&self) -> Arc<PathStore> {
        Arc::clone(&self.store)
    }

    /// Run producer and consumer until `cancel` fires or the watcher fails.
    /// A watcher failure cancels the worker too and is returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ApiError> {
        let worker = DispatchWorker::from_config(Arc::clone(&self.store), &self.config)?;
        let watch = WatchRuntime::new(self.config.watch.clone(), Arc::clone(&self.store));

        let worker_cancel = cancel.child_token();
        let worker_task = {
            let token = worker_cancel.clone();
            tokio::spawn(async move { worker.run(token).await })
        };

        let watch_result = watch.run(cancel.clone()).await;
        if let Err(e) = &watch_result {
            error!(error = %e, "Watcher failed, stopping dispatch");
        }
        worker_cancel.cancel();
        if let Err(e) = worker_task.await {
            error!(error = %e, "Dispatch worker ended abnormally");
        }

        info!("Daemon stopped");
        watch_result
    }
}

/// Build a multi-thread runtime and run the daemon until Ctrl-C
pub fn run_until_ctrl_c(config: BeholderConfig) -> Result<(), ApiError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown requested"),
                Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
            }
            signal_cancel.cancel();
        });

        info!(directory = %config.watch.directory.display(), "Starting daemon");
        Daemon::new(config).run(cancel).await
    })
}
