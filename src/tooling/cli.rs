//! CLI Tooling
//!
//! Command-line interface for running the daemon and inspecting its
//! configuration.

use crate::config::{BeholderConfig, ConfigLoader};
use crate::daemon;
use crate::error::ApiError;
use crate::logging::init_logging;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// Beholder - turn filesystem changes into CDN refresh and preload requests
#[derive(Parser)]
#[command(name = "beholder")]
#[command(about = "Watch a directory and keep an edge cache in sync with it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path, layered over the global config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Watch and dispatch in the foreground until Ctrl-C
    Run,
    /// Print the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Load and validate the configuration
    Validate,
}

/// CLI context holding the merged configuration
pub struct CliContext {
    config: BeholderConfig,
    config_path: Option<PathBuf>,
}

impl CliContext {
    /// Load configuration and apply the logging flags of `cli` over it
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = ConfigLoader::load(cli.config.as_deref())?;
        apply_log_overrides(&mut config, cli);
        Ok(Self {
            config,
            config_path: cli.config.clone(),
        })
    }

    pub fn config(&self) -> &BeholderConfig {
        &self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Run => {
                self.config.validate()?;
                init_logging(Some(&self.config.logging))?;
                info!(config = ?self.config_path, "Configuration loaded");
                daemon::run_until_ctrl_c(self.config.clone())?;
                Ok("Daemon stopped".to_string())
            }
            Commands::Config { format } => render_config(&self.config, format),
            Commands::Validate => {
                self.config.validate()?;
                Ok(format!(
                    "Configuration is valid ({})",
                    config_source(self.config_path.as_deref(), ConfigLoader::global_config_path())
                ))
            }
        }
    }
}

/// Most specific file the configuration came from, or `defaults`
fn config_source(explicit: Option<&Path>, global: Option<PathBuf>) -> String {
    match (explicit, global) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(global)) if global.exists() => global.display().to_string(),
        _ => "defaults".to_string(),
    }
}

fn apply_log_overrides(config: &mut BeholderConfig, cli: &Cli) {
    let logging = &mut config.logging;
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        logging.file = Some(file.clone());
    }
}

fn render_config(config: &BeholderConfig, format: &str) -> Result<String, ApiError> {
    match format {
        "toml" => toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        "json" => serde_json::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        other => Err(ApiError::ConfigError(format!(
            "Invalid output format: {} (must be 'toml' or 'json')",
            other
        ))),
    }
}
