//! Configuration System
//!
//! Layered configuration for the synchronization engine: built-in defaults,
//! a global user file, workspace files, then `MERKLE_SYNC__`-prefixed
//! environment variables, highest last. Values are validated after merging.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Storage location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tree and build settings
    #[serde(default)]
    pub tree: TreeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the sled database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Tree defaults and build scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Logical database the CLI operates on
    #[serde(default = "default_database")]
    pub database: String,

    /// Height used by `create` when none is given
    #[serde(default = "default_height")]
    pub default_height: u32,

    /// Maximum leaves per scheduled build
    #[serde(default = "default_build_batch_size")]
    pub build_batch_size: usize,

    /// Interval between scheduled builds
    #[serde(default = "default_build_interval_ms")]
    pub build_interval_ms: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_height: default_height(),
            build_batch_size: default_build_batch_size(),
            build_interval_ms: default_build_interval_ms(),
        }
    }
}

pub(crate) fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "merkle-sync")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".merkle-sync/store"))
}

pub(crate) fn default_database() -> String {
    "default".to_string()
}

pub(crate) fn default_height() -> u32 {
    12
}

pub(crate) fn default_build_batch_size() -> usize {
    100
}

pub(crate) fn default_build_interval_ms() -> u64 {
    5_000
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Storage(String),
    Tree(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Tree(msg) => write!(f, "Tree: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SyncConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "Store path cannot be empty".to_string(),
            ));
        }

        if self.tree.database.is_empty() || self.tree.database.contains('/') {
            errors.push(ValidationError::Tree(format!(
                "Invalid database name '{}'",
                self.tree.database
            )));
        }
        if self.tree.default_height == 0 || self.tree.default_height > crate::types::MAX_HEIGHT {
            errors.push(ValidationError::Tree(format!(
                "default_height must be in 1..=64, got {}",
                self.tree.default_height
            )));
        }
        if self.tree.build_batch_size == 0 {
            errors.push(ValidationError::Tree(
                "build_batch_size must be positive".to_string(),
            ));
        }
        if self.tree.build_interval_ms == 0 {
            errors.push(ValidationError::Tree(
                "build_interval_ms must be positive".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
