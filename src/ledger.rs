//! Root Ledger
//!
//! Append-only record of every root the tree has committed to, together with
//! the version it was committed at and the tree height. Historical node and
//! witness queries start here: a caller hands in a root hash, the ledger
//! resolves it to a version, and the node store is read as of that version.

use crate::error::SyncError;
use crate::store::{decode_u64, read_record, write_record, KvAccess, Storage};
use crate::store::{META, ROOT_INDEX, ROOT_LEDGER};
use crate::types::{hash_to_hex, Hash, Version};
use serde::{Deserialize, Serialize};
use tracing::error;

const HEIGHT_KEY: &[u8] = b"height";
const LATEST_VERSION_KEY: &[u8] = b"latest_version";

/// A committed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub root: Hash,
    pub version: Version,
    pub height: u32,
    /// Wall-clock commit time (milliseconds since epoch), for audit only.
    pub committed_at_ms: i64,
}

pub struct RootLedger<S = sled::Tree> {
    database: String,
    roots: S,
    by_root: S,
    meta: S,
}

impl<S: KvAccess> RootLedger<S> {
    pub fn new(database: impl Into<String>, roots: S, by_root: S, meta: S) -> Self {
        Self {
            database: database.into(),
            roots,
            by_root,
            meta,
        }
    }

    pub fn get_height(&self) -> Result<Option<u32>, S::Error> {
        match self.meta.read(HEIGHT_KEY)? {
            Some(bytes) => Ok(Some(decode_u64(META, &bytes)? as u32)),
            None => Ok(None),
        }
    }

    /// Fix the tree height. Fails if a height was already set.
    pub fn set_initial_height(&self, height: u32) -> Result<(), S::Error> {
        if self.get_height()?.is_some() {
            return Err(SyncError::AlreadyExists(self.database.clone()).into());
        }
        self.meta
            .write(HEIGHT_KEY, u64::from(height).to_be_bytes().to_vec())
    }

    pub fn latest_version(&self) -> Result<Option<Version>, S::Error> {
        match self.meta.read(LATEST_VERSION_KEY)? {
            Some(bytes) => Ok(Some(decode_u64(META, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Append a record for `root` at `version`.
    ///
    /// `version` must be strictly greater than the latest recorded version.
    pub fn create_metadata(
        &self,
        root: Hash,
        version: Version,
        committed_at_ms: i64,
    ) -> Result<RootRecord, S::Error> {
        let height = self
            .get_height()?
            .ok_or_else(|| SyncError::NotCreated(self.database.clone()))?;
        if let Some(latest) = self.latest_version()? {
            if version <= latest {
                error!(
                    database = %self.database,
                    latest,
                    attempted = version,
                    "Refusing non-increasing root record"
                );
                return Err(SyncError::MonotonicityViolation {
                    latest,
                    attempted: version,
                }
                .into());
            }
        }

        let record = RootRecord {
            root,
            version,
            height,
            committed_at_ms,
        };
        write_record(&self.roots, ROOT_LEDGER, &version.to_be_bytes(), &record)?;
        // Keep the earliest version for a root that recurs.
        if self.by_root.read(&root)?.is_none() {
            self.by_root.write(&root, version.to_be_bytes().to_vec())?;
        }
        self.meta
            .write(LATEST_VERSION_KEY, version.to_be_bytes().to_vec())?;
        Ok(record)
    }

    pub fn get_record(&self, version: Version) -> Result<Option<RootRecord>, S::Error> {
        read_record(&self.roots, ROOT_LEDGER, &version.to_be_bytes())
    }

    /// Earliest record that committed `root`.
    pub fn get_metadata_by_root(&self, root: &Hash) -> Result<Option<RootRecord>, S::Error> {
        match self.by_root.read(root)? {
            Some(bytes) => self.get_record(decode_u64(ROOT_INDEX, &bytes)?),
            None => Ok(None),
        }
    }

    /// Like [`get_metadata_by_root`](Self::get_metadata_by_root), failing on unknown roots.
    pub fn require_root(&self, root: &Hash) -> Result<RootRecord, S::Error> {
        self.get_metadata_by_root(root)?
            .ok_or_else(|| SyncError::RootNotFound(hash_to_hex(root)).into())
    }
}

impl RootLedger<sled::Tree> {
    pub fn open(storage: &Storage, database: &str) -> Result<Self, SyncError> {
        Ok(Self::new(
            database,
            storage.open_tree(database, ROOT_LEDGER)?,
            storage.open_tree(database, ROOT_INDEX)?,
            storage.open_tree(database, META)?,
        ))
    }

    /// Most recently committed record.
    pub fn latest(&self) -> Result<Option<RootRecord>, SyncError> {
        match self.roots.last()? {
            Some((_, bytes)) => Ok(Some(crate::store::decode(ROOT_LEDGER, &bytes)?)),
            None => Ok(None),
        }
    }

    /// All records in commit order.
    pub fn records(&self) -> Result<Vec<RootRecord>, SyncError> {
        let mut out = Vec::new();
        for item in self.roots.iter() {
            let (_, bytes) = item?;
            out.push(crate::store::decode(ROOT_LEDGER, &bytes)?);
        }
        Ok(out)
    }

    pub(crate) fn trees(&self) -> (&sled::Tree, &sled::Tree, &sled::Tree) {
        (&self.roots, &self.by_root, &self.meta)
    }
}
