//! Pruning engine
//!
//! Rewrites a drained refresh/preload tree pair in place before dispatch.

pub mod simple;

pub use simple::SimplePruning;

use crate::config::PruningConfig;
use crate::error::ApiError;
use crate::store::PathTree;

/// Strategy that removes redundant operations from a drained tree pair
pub trait Pruner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mutates both trees. Filesystem errors other than a missing file
    /// propagate to the caller.
    fn prune(&self, refresh: &mut PathTree, preload: &mut PathTree) -> Result<(), ApiError>;
}

/// Build the pruner selected by `config.method`
pub fn create_pruner(config: &PruningConfig) -> Result<Box<dyn Pruner>, ApiError> {
    match config.method.to_ascii_lowercase().as_str() {
        "simple" => Ok(Box::new(SimplePruning::from_config(config))),
        other => Err(ApiError::ConfigError(format!(
            "unknown pruning method '{}'",
            other
        ))),
    }
}
