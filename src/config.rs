//! Configuration parsing and structures
//!
//! The daemon reads an optional YAML file at startup. Mount options that
//! enforce permission checks and auto-unmount are not configurable; only
//! where the tree is mounted and how it is named are.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::env::substitute_env_vars;

/// Mount point used when none is configured
pub const DEFAULT_MOUNT_PATH: &str = "/opt/users";

/// Filesystem name shown in the mount table
pub const DEFAULT_FSNAME: &str = "accountfs";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Mount point configuration
    #[serde(default)]
    pub mount: MountConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file instead of stderr. Stderr is silenced while
    /// the filesystem is mounted, so this is the only way to see logs from
    /// a running mount.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Mount point configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    /// Path where the filesystem will be mounted
    #[serde(default = "default_mount_path")]
    pub path: PathBuf,

    /// Filesystem name reported to the kernel
    #[serde(default = "default_fsname")]
    pub fsname: String,

    /// Create the mount point directory if it is missing
    #[serde(default = "default_true")]
    pub create_mount_point: bool,
}

fn default_mount_path() -> PathBuf {
    PathBuf::from(DEFAULT_MOUNT_PATH)
}

fn default_fsname() -> String {
    DEFAULT_FSNAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            path: default_mount_path(),
            fsname: default_fsname(),
            create_mount_point: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a YAML string, substituting `${VAR}`
    /// references from the environment first
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let content = substitute_env_vars(content)?;

        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mount.path.is_absolute() {
            return Err(ConfigError::ValidationError(format!(
                "Mount path must be absolute: {:?}",
                self.mount.path
            )));
        }

        let fsname = &self.mount.fsname;
        if fsname.is_empty() {
            return Err(ConfigError::ValidationError(
                "Mount fsname cannot be empty".to_string(),
            ));
        }
        if fsname.contains(',') || fsname.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "Mount fsname must not contain commas or whitespace: {:?}",
                fsname
            )));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}
