//! Configuration
//!
//! Typed sections for the watcher, the dispatch loop, pruning, the cache
//! handler and logging. Values are layered by [`ConfigLoader`]: built-in
//! defaults, the global config file, an explicit `--config` file and finally
//! `BEHOLDER_*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::logging::{validate_logging_config, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeholderConfig {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub pruning: PruningConfig,

    #[serde(default)]
    pub handler: HandlerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BeholderConfig {
    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.watch.directory.as_os_str().is_empty() {
            return Err(ApiError::ConfigError(
                "watch.directory must not be empty".to_string(),
            ));
        }
        if self.dispatch.check_interval_secs == 0 {
            return Err(ApiError::ConfigError(
                "dispatch.check_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.pruning.merge_threshold == 0 {
            return Err(ApiError::ConfigError(
                "pruning.merge_threshold must be at least 1".to_string(),
            ));
        }
        if !self.pruning.method.eq_ignore_ascii_case("simple") {
            return Err(ApiError::ConfigError(format!(
                "unknown pruning method '{}'",
                self.pruning.method
            )));
        }

        let method = self.handler.method.to_ascii_lowercase();
        match method.as_str() {
            "console_log" => {}
            "http" => {
                if self.handler.http.endpoint.trim().is_empty() {
                    return Err(ApiError::ConfigError(
                        "handler.http.endpoint is required for the http handler".to_string(),
                    ));
                }
                if self.handler.http.total_timeout_secs == 0 {
                    return Err(ApiError::ConfigError(
                        "handler.http.total_timeout_secs must be at least 1".to_string(),
                    ));
                }
            }
            other => {
                return Err(ApiError::ConfigError(format!(
                    "unknown handler method '{}'",
                    other
                )))
            }
        }

        validate_logging_config(&self.logging)
    }
}

/// Producer side: what to watch and which events become store entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Capacity hint for the raw event channel, in KiB of 1 KiB events
    #[serde(default = "default_buffer_size_kb")]
    pub buffer_size_kb: usize,

    /// Prefix removed from every event path before it reaches the store
    #[serde(default)]
    pub trim_start: String,

    /// Extensions with their leading dot, compared case-insensitively
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Case-insensitive prefixes of full event paths
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    #[serde(default)]
    pub preload_enabled: bool,

    #[serde(default = "default_true")]
    pub on_created: bool,

    #[serde(default = "default_true")]
    pub on_changed: bool,

    #[serde(default = "default_true")]
    pub on_deleted: bool,

    #[serde(default = "default_true")]
    pub on_renamed: bool,

    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_buffer_size_kb() -> usize {
    256
}

fn default_heartbeat_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            buffer_size_kb: default_buffer_size_kb(),
            trim_start: String::new(),
            exclude_extensions: Vec::new(),
            exclude_paths: Vec::new(),
            preload_enabled: false,
            on_created: true,
            on_changed: true,
            on_deleted: true,
            on_renamed: true,
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

/// Consumer side: how often and how much to drain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Values below 1 drain nothing
    #[serde(default = "default_refresh_take_count")]
    pub refresh_take_count: i64,

    #[serde(default = "default_preload_take_count")]
    pub preload_take_count: i64,
}

fn default_check_interval_secs() -> u64 {
    600
}

fn default_refresh_take_count() -> i64 {
    1000
}

fn default_preload_take_count() -> i64 {
    200
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            refresh_take_count: default_refresh_take_count(),
            preload_take_count: default_preload_take_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruningConfig {
    #[serde(default = "default_pruning_method")]
    pub method: String,

    /// Child count at which a directory is refreshed as a whole
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: usize,

    /// Root for the preload existence check; empty disables the check
    #[serde(default)]
    pub preload_check_root: String,
}

fn default_pruning_method() -> String {
    "simple".to_string()
}

fn default_merge_threshold() -> usize {
    10
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            method: default_pruning_method(),
            merge_threshold: default_merge_threshold(),
            preload_check_root: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// `console_log` or `http`
    #[serde(default = "default_handler_method")]
    pub method: String,

    #[serde(default)]
    pub console_log: ConsoleLogConfig,

    #[serde(default)]
    pub http: HttpHandlerConfig,
}

fn default_handler_method() -> String {
    "console_log".to_string()
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            method: default_handler_method(),
            console_log: ConsoleLogConfig::default(),
            http: HttpHandlerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleLogConfig {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpHandlerConfig {
    /// Base URL; requests go to `{endpoint}/refresh` and `{endpoint}/preload`
    #[serde(default)]
    pub endpoint: String,

    /// Prepended to every path, usually the public origin
    #[serde(default)]
    pub prefix: String,

    /// Bearer token; empty sends no authorization header
    #[serde(default)]
    pub api_token: String,

    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Bound on one whole handler call, retries included
    #[serde(default = "default_total_timeout_secs")]
    pub total_timeout_secs: u64,
}

fn default_max_retry() -> u32 {
    5
}

fn default_total_timeout_secs() -> u64 {
    30
}

impl Default for HttpHandlerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            prefix: String::new(),
            api_token: String::new(),
            max_retry: default_max_retry(),
            total_timeout_secs: default_total_timeout_secs(),
        }
    }
}
