//! Per-key serialization for poll and user operations.
//!
//! Commands from different users may run concurrently, but operations
//! targeting the same poll id or the same user id must not interleave their
//! check-then-write sections. Each registry hands out one async mutex per
//! key; acquisition is bounded so no operation blocks indefinitely.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::TransientStorageFailure;

/// Registry of async locks, one per key.
#[derive(Debug)]
pub struct KeyedLocks {
    /// Registry label used in timeout errors ("poll" or "user").
    scope: &'static str,
    locks: DashMap<u64, Arc<Mutex<()>>>,
    timeout: Duration,
}

impl KeyedLocks {
    /// Create a registry with the given acquisition bound.
    pub fn new(scope: &'static str, timeout: Duration) -> Self {
        Self {
            scope,
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the lock for `key`, waiting at most the configured timeout.
    ///
    /// An elapsed wait surfaces as [`TransientStorageFailure`]; the caller
    /// may retry the whole operation since no write has happened yet.
    pub async fn acquire(&self, key: u64) -> Result<OwnedMutexGuard<()>, TransientStorageFailure> {
        let lock = self.locks.entry(key).or_default().value().clone();

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| TransientStorageFailure {
                scope: self.scope,
                key,
                waited_ms: self.timeout.as_millis() as u64,
            })
    }
}
