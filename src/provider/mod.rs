//! Cache providers
//!
//! A [`CacheHandler`] receives the pruned entries of one drain and turns them
//! into refresh and preload requests against an edge cache. Handlers treat
//! the entries as read-only and report a handled upstream failure as
//! `Ok(false)`; only unexpected faults and cancellation are errors.

pub mod console;
pub mod http;

pub use console::ConsoleLogHandler;
pub use http::HttpHandler;

use crate::config::HandlerConfig;
use crate::error::ApiError;
use crate::store::PathEntry;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait CacheHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Invalidate every file entry, then every forced directory entry
    async fn refresh(
        &self,
        entries: &[PathEntry],
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError>;

    /// Warm every file entry; directories can not be preloaded
    async fn preload(
        &self,
        entries: &[PathEntry],
        cancel: &CancellationToken,
    ) -> Result<bool, ApiError>;
}

/// Object paths one handler call sends, already prefixed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPaths {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

impl ObjectPaths {
    /// Files plus forced directories, the latter with a trailing `/`
    pub fn for_refresh(entries: &[PathEntry], prefix: &str) -> Self {
        let files = file_paths(entries, prefix);
        let directories = entries
            .iter()
            .filter(|e| e.is_directory && e.will_force_update)
            .map(|e| {
                let mut path = format!("{}{}", prefix, e.path);
                if !path.ends_with('/') {
                    path.push('/');
                }
                path
            })
            .collect();
        Self { files, directories }
    }

    pub fn for_preload(entries: &[PathEntry], prefix: &str) -> Self {
        Self {
            files: file_paths(entries, prefix),
            directories: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

fn file_paths(entries: &[PathEntry], prefix: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|e| !e.is_directory)
        .map(|e| format!("{}{}", prefix, e.path))
        .collect()
}

/// Build the handler selected by `config.method`
pub fn create_handler(config: &HandlerConfig) -> Result<Box<dyn CacheHandler>, ApiError> {
    match config.method.to_ascii_lowercase().as_str() {
        "console_log" => Ok(Box::new(ConsoleLogHandler::new(
            config.console_log.prefix.clone(),
        ))),
        "http" => Ok(Box::new(HttpHandler::new(config.http.clone())?)),
        other => Err(ApiError::ConfigError(format!(
            "unknown handler method '{}'",
            other
        ))),
    }
}
