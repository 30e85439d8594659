//! Configuration management for the stager
//!
//! Settings are loaded from environment variables with defaults and passed
//! explicitly into the orchestrator; nothing here is global.
//!
//! # Environment Variables
//!
//! - `STAGER_BUILDPACKS_DIR`: directory holding the installed buildpacks - default: "/var/vcap/packages/buildpacks"
//! - `STAGER_CACHE_DIR`: root of the per-app compile caches - default: system temp dir + "stager-cache"
//! - `STAGER_GIT`: git executable used to fetch buildpack URLs - default: "git"
//! - `STAGER_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use stager::StagerConfig;
//!
//! let config = StagerConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_BUILDPACKS_DIR: &str = "/var/vcap/packages/buildpacks";
const DEFAULT_CACHE_DIR_NAME: &str = "stager-cache";
const DEFAULT_GIT: &str = "git";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagerConfig {
    /// Children of this directory are the local buildpacks, tried in name order
    pub buildpacks_dir: PathBuf,

    /// Root of the compile caches; each droplet gets its own subdirectory
    pub cache_dir: PathBuf,

    /// Git executable for buildpack URLs
    pub git: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for StagerConfig {
    fn default() -> Self {
        let buildpacks_dir = env::var("STAGER_BUILDPACKS_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILDPACKS_DIR));

        let cache_dir = env::var("STAGER_CACHE_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_CACHE_DIR_NAME));

        let git = env::var("STAGER_GIT")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GIT));

        let log_level = env::var("STAGER_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            buildpacks_dir,
            cache_dir,
            git,
            log_level,
        }
    }
}

impl StagerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any path is empty or the log level is unknown
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buildpacks_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Buildpacks directory cannot be empty".to_string(),
            ));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Cache directory cannot be empty".to_string(),
            ));
        }
        if self.git.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Git executable cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}
