//! Merge rules: defaults, override order, conflict handling.

use crate::config::{
    default_build_batch_size, default_build_interval_ms, default_database, default_height,
    default_store_path,
};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default(
            "storage.path",
            default_store_path().to_string_lossy().to_string(),
        )?
        .set_default("tree.database", default_database())?
        .set_default("tree.default_height", u64::from(default_height()))?
        .set_default("tree.build_batch_size", default_build_batch_size() as u64)?
        .set_default("tree.build_interval_ms", default_build_interval_ms())
}
