//! Sled database handle

use crate::error::StorageError;
use std::path::Path;
use tracing::debug;

/// Handle to the embedded sled database backing every tree.
///
/// Cheap to clone; all clones share the same underlying database.
#[derive(Clone)]
pub struct Storage {
    db: sled::Db,
}

impl Storage {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path).map_err(|e| {
            StorageError::Backend(format!("Failed to open sled database at {:?}: {}", path, e))
        })?;
        debug!(path = %path.display(), "Opened sled database");
        Ok(Self { db })
    }

    /// Open a throwaway database that is removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Open the `collection` tree belonging to logical database `database`.
    pub fn open_tree(&self, database: &str, collection: &str) -> Result<sled::Tree, StorageError> {
        let name = format!("{}/{}", database, collection);
        self.db
            .open_tree(name.as_bytes())
            .map_err(|e| StorageError::Backend(format!("Failed to open tree {}: {}", name, e)))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
