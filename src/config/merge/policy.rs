//! Base layer every merge starts from

use crate::config::BeholderConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized built-in defaults, so every key exists
/// before any file or environment layer is applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&BeholderConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
