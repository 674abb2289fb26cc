//! Sequencer
//!
//! Durable named counters. `next` atomically returns the current value of a
//! counter and persists its successor, so concurrent callers (threads or
//! service handles sharing the database) never observe the same value.

use crate::error::{StorageError, SyncError};
use crate::store::{decode_u64, SEQUENCER};

/// Per-database set of monotonically increasing counters.
#[derive(Clone)]
pub struct Sequencer {
    counters: sled::Tree,
}

impl Sequencer {
    pub fn new(counters: sled::Tree) -> Self {
        Self { counters }
    }

    /// Return the current value of `key` and advance it by one.
    ///
    /// The read-increment-write happens as a single compare-and-swap loop
    /// inside sled; on any failure the counter is left untouched.
    pub fn next(&self, key: &str) -> Result<u64, SyncError> {
        let mut corrupt = None;
        let previous = self
            .counters
            .fetch_and_update(key.as_bytes(), |old| advance(old, &mut corrupt))?;
        if let Some(err) = corrupt {
            return Err(err);
        }
        match previous {
            Some(bytes) => decode_u64(SEQUENCER, &bytes),
            None => Ok(0),
        }
    }

    /// Value the next call to `next` would return, without advancing.
    pub fn peek(&self, key: &str) -> Result<u64, SyncError> {
        match self.counters.get(key.as_bytes()).map_err(StorageError::from)? {
            Some(bytes) => decode_u64(SEQUENCER, &bytes),
            None => Ok(0),
        }
    }
}

/// Successor of a stored counter for one compare-and-swap attempt.
///
/// sled may call this several times for one `next`; only the outcome of the
/// final attempt is kept in `corrupt`.
fn advance(old: Option<&[u8]>, corrupt: &mut Option<SyncError>) -> Option<Vec<u8>> {
    *corrupt = None;
    match old {
        None => Some(1u64.to_be_bytes().to_vec()),
        Some(bytes) => match decode_u64(SEQUENCER, bytes) {
            Ok(value) => Some((value + 1).to_be_bytes().to_vec()),
            Err(e) => {
                *corrupt = Some(e);
                Some(bytes.to_vec())
            }
        },
    }
}
