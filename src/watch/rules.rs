//! Translation of change events into store entries

use super::events::{ChangeEvent, EventFilter};
use crate::error::ApiError;
use crate::store::PathStore;
use crate::types::Category;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Applies change events to the store through the gate
#[derive(Debug, Clone)]
pub struct EventRules {
    store: Arc<PathStore>,
    filter: EventFilter,
    preload_enabled: bool,
}

impl EventRules {
    pub fn new(store: Arc<PathStore>, filter: EventFilter, preload_enabled: bool) -> Self {
        Self {
            store,
            filter,
            preload_enabled,
        }
    }

    /// Record one event. Excluded events return immediately; everything else
    /// waits for the gate, so a cancelled wait records nothing.
    pub async fn apply(
        &self,
        event: &ChangeEvent,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        if self.filter.is_excluded(event.path()) {
            return Ok(());
        }

        self.store.wait(cancel).await?;

        match event {
            ChangeEvent::Created { path, is_dir } => {
                let path = self.filter.trim(path);
                info!(path = %path, "File system entry created");
                if !is_dir && self.preload_enabled {
                    let just_created = !self.store.exists(Category::Refresh, &path);
                    self.store
                        .add_path(Category::Preload, &path, false, false, just_created);
                }
            }
            ChangeEvent::Changed { path, is_dir } => {
                let path = self.filter.trim(path);
                info!(path = %path, "File system entry changed");
                self.store
                    .add_path(Category::Refresh, &path, *is_dir, *is_dir, false);
                if !is_dir && self.preload_enabled {
                    self.store
                        .add_path(Category::Preload, &path, false, false, false);
                }
            }
            ChangeEvent::Deleted { path, is_dir } => {
                let path = self.filter.trim(path);
                info!(path = %path, "File system entry deleted");
                self.store
                    .add_path(Category::Refresh, &path, *is_dir, *is_dir, false);
            }
            ChangeEvent::Renamed { from, to, is_dir } => {
                let from = self.filter.trim(from);
                let to = self.filter.trim(to);
                info!(from = %from, to = %to, "File system entry renamed");
                self.store
                    .add_path(Category::Refresh, &from, *is_dir, *is_dir, false);
                if !is_dir && self.preload_enabled {
                    self.store.add_path(Category::Preload, &to, false, false, false);
                }
            }
        }
        Ok(())
    }
}
