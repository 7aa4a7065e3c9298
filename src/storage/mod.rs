//! Storage module for the resource directory
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Resource registration, lookup, title sync and removal
//! - Batched scanning in directory order and title search
//! - Persisting issued links for the link cache
//! - Recording reports

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{lock_storage, SharedStorage, Storage, StorageError, StorageResult};

use crate::ChanfindError;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Opens (or creates) the directory database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ChanfindError> {
    SqliteStorage::new(path)
}

/// A link previously issued for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLink {
    /// The issued access link
    pub link: String,

    /// When the link was issued
    pub issued_at: DateTime<Utc>,
}

impl CachedLink {
    pub fn new(link: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            link: link.into(),
            issued_at,
        }
    }

    /// Returns how long ago the link was issued
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.issued_at
    }

    /// A link is fresh while its age is strictly below the TTL
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// One directory entry
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    /// Position in directory iteration order
    pub seq: i64,

    /// Opaque external identifier
    pub id: String,

    /// Display title (may be empty until synced from the external system)
    pub title: String,

    /// Most recently issued link, if any
    pub cached_link: Option<CachedLink>,
}

/// One page of title search hits
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Hits in directory order
    pub records: Vec<ResourceRecord>,

    /// Offset of the next page, or None when this page is the last
    pub next_cursor: Option<u64>,

    /// Total number of hits across all pages
    pub total: u64,
}

/// A persisted report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub category: String,
    pub detail: String,
    pub resource_id: Option<String>,
    pub reported_at: DateTime<Utc>,
}
