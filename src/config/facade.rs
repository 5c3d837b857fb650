//! ConfigLoader facade delegating to merge service.

use super::merge::MergeService;
use super::BeholderConfig;
use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Path of the global config file, when the platform defines one
    pub fn global_config_path() -> Option<PathBuf> {
        super::sources::global_file::path()
    }

    /// Load configuration from the global file, an optional explicit file
    /// and the environment.
    pub fn load(explicit: Option<&Path>) -> Result<BeholderConfig, ApiError> {
        Ok(MergeService::load(explicit)?)
    }

    /// Load and validate in one step.
    pub fn load_validated(explicit: Option<&Path>) -> Result<BeholderConfig, ApiError> {
        let config = Self::load(explicit)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only.
    pub fn load_from_file(path: &Path) -> Result<BeholderConfig, ApiError> {
        Ok(MergeService::load_file_only(path)?)
    }

    /// Create default configuration.
    pub fn default() -> BeholderConfig {
        BeholderConfig::default()
    }
}
