//! Configuration sources, applied in precedence order by the loader.

pub mod global_file;
pub mod workspace_file;
