//! Configuration loader

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::SyncConfig;
use crate::error::SyncError;
use config::{Environment, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration for `workspace_root`.
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables (`MERKLE_SYNC__TREE__DEFAULT_HEIGHT=16`, ...)
    /// 2. Workspace files (`config/config.toml`, `config/{env}.toml`)
    /// 3. Global file (`~/.config/merkle-sync/config.toml`)
    /// 4. Defaults
    pub fn load(workspace_root: &Path) -> Result<SyncConfig, SyncError> {
        Self::load_with_global(workspace_root, global_file::global_config_path())
    }

    /// Like [`load`](Self::load) with an explicit global config path.
    pub fn load_with_global(
        workspace_root: &Path,
        global: Option<PathBuf>,
    ) -> Result<SyncConfig, SyncError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(env_source());
        let config: SyncConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Load configuration from a single file (plus defaults and environment).
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        let config: SyncConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    /// Validate a configuration, folding every problem into one error.
    pub(crate) fn validated(config: SyncConfig) -> Result<SyncConfig, SyncError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SyncError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("MERKLE_SYNC")
        .separator("__")
        .try_parsing(true)
}
