//! Durable storage
//!
//! All persistent state lives in one embedded sled database. Each logical
//! database gets its own set of sled trees, named `{database}/{collection}`.
//! Components never talk to sled directly: they go through [`KvAccess`],
//! which is implemented both for plain `sled::Tree` handles and for the
//! `TransactionalTree` views handed out inside a sled transaction. The same
//! node, pool, and ledger logic therefore runs unchanged inside `build`'s
//! atomic unit of work and in ordinary read paths. Ordered range reads
//! ([`KvScan`]) only exist outside transactions.

pub mod nodes;
pub mod persistence;

pub use nodes::{NodeEntry, NodeStore};
pub use persistence::Storage;

use crate::error::{StorageError, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionalTree};
use sled::IVec;

pub const NODES: &str = "nodes";
pub const NODE_HISTORY: &str = "node_history";
pub const PENDING_LEAVES: &str = "pending_leaves";
pub const PENDING_ORDER: &str = "pending_order";
pub const ROOT_LEDGER: &str = "root_ledger";
pub const ROOT_INDEX: &str = "root_index";
pub const META: &str = "meta";
pub const SEQUENCER: &str = "sequencer";

/// Minimal key-value surface shared by plain and transactional sled trees.
pub trait KvAccess {
    type Error: From<SyncError>;

    fn read(&self, key: &[u8]) -> Result<Option<IVec>, Self::Error>;
    fn write(&self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error>;
    fn delete(&self, key: &[u8]) -> Result<(), Self::Error>;
}

impl KvAccess for sled::Tree {
    type Error = SyncError;

    fn read(&self, key: &[u8]) -> Result<Option<IVec>, SyncError> {
        Ok(self.get(key)?)
    }

    fn write(&self, key: &[u8], value: Vec<u8>) -> Result<(), SyncError> {
        self.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), SyncError> {
        self.remove(key)?;
        Ok(())
    }
}

/// Ordered reads over a plain tree.
pub trait KvScan: KvAccess {
    /// Last entry whose key lies in `low..=high`.
    fn last_in(&self, low: &[u8], high: &[u8]) -> Result<Option<(IVec, IVec)>, Self::Error>;
}

impl KvScan for sled::Tree {
    fn last_in(&self, low: &[u8], high: &[u8]) -> Result<Option<(IVec, IVec)>, SyncError> {
        Ok(self.range(low..=high).next_back().transpose()?)
    }
}

impl<T: KvScan + ?Sized> KvScan for &T {
    fn last_in(&self, low: &[u8], high: &[u8]) -> Result<Option<(IVec, IVec)>, Self::Error> {
        (**self).last_in(low, high)
    }
}

impl KvAccess for TransactionalTree {
    type Error = ConflictableTransactionError<SyncError>;

    fn read(&self, key: &[u8]) -> Result<Option<IVec>, Self::Error> {
        Ok(self.get(key)?)
    }

    fn write(&self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error> {
        self.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), Self::Error> {
        self.remove(key)?;
        Ok(())
    }
}

impl<T: KvAccess + ?Sized> KvAccess for &T {
    type Error = T::Error;

    fn read(&self, key: &[u8]) -> Result<Option<IVec>, Self::Error> {
        (**self).read(key)
    }

    fn write(&self, key: &[u8], value: Vec<u8>) -> Result<(), Self::Error> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), Self::Error> {
        (**self).delete(key)
    }
}

impl From<SyncError> for ConflictableTransactionError<SyncError> {
    fn from(err: SyncError) -> Self {
        ConflictableTransactionError::Abort(err)
    }
}

pub(crate) fn encode<T: Serialize>(collection: &'static str, value: &T) -> Result<Vec<u8>, SyncError> {
    bincode::serialize(value).map_err(|e| {
        SyncError::Storage(StorageError::Corrupt {
            collection,
            reason: format!("failed to serialize: {}", e),
        })
    })
}

pub(crate) fn decode<T: DeserializeOwned>(
    collection: &'static str,
    bytes: &[u8],
) -> Result<T, SyncError> {
    bincode::deserialize(bytes).map_err(|e| {
        SyncError::Storage(StorageError::Corrupt {
            collection,
            reason: format!("failed to deserialize: {}", e),
        })
    })
}

pub(crate) fn decode_u64(collection: &'static str, bytes: &[u8]) -> Result<u64, SyncError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        SyncError::Storage(StorageError::Corrupt {
            collection,
            reason: format!("expected 8-byte integer, found {} bytes", bytes.len()),
        })
    })?;
    Ok(u64::from_be_bytes(raw))
}

/// Read and decode a record, if present.
pub(crate) fn read_record<T, S>(
    tree: &S,
    collection: &'static str,
    key: &[u8],
) -> Result<Option<T>, S::Error>
where
    T: DeserializeOwned,
    S: KvAccess + ?Sized,
{
    match tree.read(key)? {
        Some(bytes) => Ok(Some(decode(collection, &bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a record.
pub(crate) fn write_record<T, S>(
    tree: &S,
    collection: &'static str,
    key: &[u8],
    value: &T,
) -> Result<(), S::Error>
where
    T: Serialize,
    S: KvAccess + ?Sized,
{
    let bytes = encode(collection, value)?;
    tree.write(key, bytes)
}
