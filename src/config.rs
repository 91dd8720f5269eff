//! Application configuration.
//!
//! Handles loading configuration from environment variables and .env files.

use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};

use crate::constants::config::{APP_DIR, ASSET_CACHE_DIR, DEFAULT_LOG_FILTER, SETTINGS_FILE};
use crate::error::{Error, Result};

/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The application name
    app_name: String,
    /// The application version
    app_version: String,
    /// Directory holding `settings.json`
    pub config_dir: PathBuf,
    /// Directory where bundled service assets are unpacked
    pub data_dir: PathBuf,
    /// Log filter directive for the subscriber
    pub log_filter: String,
}

impl Config {
    /// Get the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Get the application version.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Build a config rooted at explicit directories (used by tests and embedders).
    pub fn with_dirs(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Path of the settings file that remembers the last saved service.
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Directory where assets bundled in service archives are unpacked.
    pub fn asset_dir(&self) -> PathBuf {
        self.data_dir.join(ASSET_CACHE_DIR)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            config_dir: dirs::config_dir()
                .unwrap_or_else(env::temp_dir)
                .join(APP_DIR),
            data_dir: dirs::data_dir()
                .unwrap_or_else(env::temp_dir)
                .join(APP_DIR),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file if present
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(dir) = env::var("STAGEFLOW_CONFIG_DIR") {
            config.config_dir = expand_dir(&dir, "STAGEFLOW_CONFIG_DIR")?;
        }

        if let Ok(dir) = env::var("STAGEFLOW_DATA_DIR") {
            config.data_dir = expand_dir(&dir, "STAGEFLOW_DATA_DIR")?;
        }

        // Log filter: STAGEFLOW_LOG wins over RUST_LOG
        if let Some(filter) = env::var("STAGEFLOW_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .filter(|f| !f.trim().is_empty())
        {
            config.log_filter = filter;
        }

        Ok(config)
    }
}

/// Expand `~` in a directory override and reject paths that exist but are not directories.
fn expand_dir(raw: &str, var: &str) -> Result<PathBuf> {
    let path = PathBuf::from(shellexpand::tilde(raw.trim()).to_string());
    if path.as_os_str().is_empty() {
        return Err(Error::config(format!("{var} is empty"), "Unset it or point it at a directory"));
    }
    if is_file(&path) {
        return Err(Error::config(
            format!("{var} points at a file: {}", path.display()),
            "Point it at a directory",
        ));
    }
    Ok(path)
}

fn is_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|m| m.is_file())
}
