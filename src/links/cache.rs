//! Link cache
//!
//! Links are served from the directory record while younger than the TTL.
//! Staleness is evaluated on read; nothing sweeps expired entries.

use crate::clock::Clock;
use crate::storage::{lock_storage, SharedStorage, StorageResult};
use chrono::Duration;
use std::sync::Arc;

/// TTL-bounded view over the links stored in the directory
#[derive(Clone)]
pub struct LinkCache {
    storage: SharedStorage,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl LinkCache {
    pub fn new(storage: SharedStorage, clock: Arc<dyn Clock>, ttl: std::time::Duration) -> Self {
        Self {
            storage,
            clock,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(36_500)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached link if present and issued less than one TTL ago
    pub fn get_fresh(&self, resource_id: &str) -> StorageResult<Option<String>> {
        let cached = lock_storage(&self.storage)?.get_cached_link(resource_id)?;
        let now = self.clock.now();

        Ok(cached
            .filter(|c| c.is_fresh(now, self.ttl))
            .map(|c| c.link))
    }

    /// Overwrites the cached link, stamping it with the current time
    pub fn store(&self, resource_id: &str, link: &str) -> StorageResult<()> {
        let now = self.clock.now();
        lock_storage(&self.storage)?.store_link(resource_id, link, now)
    }
}
