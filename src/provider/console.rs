//! Handler that only logs what it would send

use super::{CacheHandler, ObjectPaths};
use crate::error::ApiError;
use crate::store::PathEntry;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ConsoleLogHandler {
    prefix: String,
}

impl ConsoleLogHandler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl CacheHandler for ConsoleLogHandler {
    fn name(&self) -> &'static str {
        "console_log"
    }

    async fn refresh(
        &self,
        entries: &[PathEntry],
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        let paths = ObjectPaths::for_refresh(entries, &self.prefix);
        for file in &paths.files {
            info!(path = %file, "Refresh file");
        }

        if cancel.is_cancelled() {
            info!("Refresh cancelled before directories");
            return Err(ApiError::Cancelled);
        }

        for dir in &paths.directories {
            info!(path = %dir, "Refresh directory");
        }
        Ok(true)
    }

    async fn preload(
        &self,
        entries: &[PathEntry],
        _cancel: &CancellationToken,
    ) -> Result<bool, ApiError> {
        for file in ObjectPaths::for_preload(entries, &self.prefix).files {
            info!(path = %file, "Preload file");
        }
        Ok(true)
    }
}
