//! Storage traits and error types
//!
//! This module defines the trait interface for directory backends and
//! associated error types.

use crate::storage::{CachedLink, ReportRecord, ResourceRecord, SearchPage};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Directory store shared between services
///
/// Guards must never be held across an `.await`.
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Locks shared storage, surfacing a poisoned lock as an error
pub fn lock_storage(
    storage: &SharedStorage,
) -> StorageResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage.lock().map_err(|_| StorageError::LockPoisoned)
}

/// Trait for directory backend implementations
///
/// Single-record reads and writes are atomic; callers never rely on
/// multi-record transactions.
pub trait Storage {
    // ===== Resource Management =====

    /// Registers a resource, or updates the title of an existing one
    ///
    /// # Returns
    ///
    /// `true` if the resource was newly created
    fn upsert_resource(&mut self, id: &str, title: &str) -> StorageResult<bool>;

    /// Replaces the title of an existing resource
    fn update_title(&mut self, id: &str, title: &str) -> StorageResult<()>;

    /// Removes a resource
    ///
    /// Removing an absent resource is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a resource was actually removed
    fn remove(&mut self, id: &str) -> StorageResult<bool>;

    // ===== Lookup =====

    /// Gets a resource with its title by ID
    fn find_by_id(&self, id: &str) -> StorageResult<Option<ResourceRecord>>;

    /// Gets the first resource whose title matches case-insensitively
    fn find_by_title(&self, title: &str) -> StorageResult<Option<ResourceRecord>>;

    /// Gets every resource in directory order
    fn list_all(&self) -> StorageResult<Vec<ResourceRecord>>;

    /// Gets up to `limit` resources that follow `after_seq` in directory order
    ///
    /// Passing `None` starts from the beginning, so a scan can be restarted at any time.
    fn list_page(&self, after_seq: Option<i64>, limit: usize) -> StorageResult<Vec<ResourceRecord>>;

    /// Searches titles sharing text fragments with `text`
    ///
    /// # Arguments
    ///
    /// * `text` - Query text (normalized)
    /// * `cursor` - Offset of the first hit to return
    /// * `limit` - Maximum number of hits to return
    fn search(&self, text: &str, cursor: u64, limit: usize) -> StorageResult<SearchPage>;

    // ===== Link Cache =====

    /// Gets the link last issued for a resource
    fn get_cached_link(&self, id: &str) -> StorageResult<Option<CachedLink>>;

    /// Stores a newly issued link
    ///
    /// The stored issue time never moves backwards.
    fn store_link(&mut self, id: &str, link: &str, issued_at: DateTime<Utc>) -> StorageResult<()>;

    // ===== Reports =====

    /// Persists a report
    fn record_report(&mut self, report: &ReportRecord) -> StorageResult<()>;

    /// Gets report counts grouped by category, most frequent first
    fn count_reports_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    // ===== Statistics =====

    /// Gets total resource count
    fn count_resources(&self) -> StorageResult<u64>;

    /// Gets the number of resources carrying a cached link
    fn count_cached_links(&self) -> StorageResult<u64>;
}
