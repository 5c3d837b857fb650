//! Global config file: `<platform config dir>/beholder/config.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::PathBuf;

/// Location of the global config file, if the platform has a config directory
pub fn path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "beholder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the global file when it exists; a missing file is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match path() {
        Some(path) if path.is_file() => Ok(builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )),
        _ => Ok(builder),
    }
}
