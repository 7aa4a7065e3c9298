//! Reporting sink for conditions found while resolving queries
//!
//! Reports are fire-and-forget: a failing sink is logged and never
//! propagates to the caller.

use crate::clock::Clock;
use crate::storage::{lock_storage, ReportRecord, SharedStorage, StorageError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a reporting sink
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Report sink unavailable: {0}")]
    Unavailable(String),
}

/// Kind of condition being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    /// The resource no longer exists upstream and was pruned
    ResourceInvalid,

    /// The resource became private and was pruned
    ResourcePrivate,

    /// Missing rights to issue a link; the resource is kept
    PermissionDenied,

    /// Any other upstream failure for a resource
    ResourceError,

    /// An issued link could not be persisted
    CacheError,

    /// A whole query failed outside the known failure classes
    SearchError,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceInvalid => "Resource_Invalid",
            Self::ResourcePrivate => "Resource_Private",
            Self::PermissionDenied => "Permission_Denied",
            Self::ResourceError => "Resource_Error",
            Self::CacheError => "Cache_Error",
            Self::SearchError => "Search_Error",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single report
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub category: ReportCategory,
    pub detail: String,
    pub resource_id: Option<String>,
}

impl Report {
    pub fn new(category: ReportCategory, detail: impl Into<String>) -> Self {
        Self {
            category,
            detail: detail.into(),
            resource_id: None,
        }
    }

    pub fn for_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Destination for reports
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn report(&self, report: &Report) -> Result<(), ReportError>;
}

/// Delivers a report, logging (never returning) any sink failure
pub async fn report_quietly(reporter: &dyn Reporter, report: Report) {
    if let Err(e) = reporter.report(&report).await {
        tracing::warn!(
            "Failed to deliver {} report: {} (detail: {})",
            report.category,
            e,
            report.detail
        );
    }
}

/// Reporter that emits structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

#[async_trait]
impl Reporter for TracingReporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError> {
        tracing::warn!(
            category = report.category.as_str(),
            resource_id = report.resource_id.as_deref().unwrap_or("-"),
            "#{} {}",
            report.category,
            report.detail
        );
        Ok(())
    }
}

/// Reporter that logs and persists reports in the directory database
pub struct StorageReporter {
    storage: SharedStorage,
    clock: Arc<dyn Clock>,
}

impl StorageReporter {
    pub fn new(storage: SharedStorage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    fn persist(&self, report: &Report) -> Result<(), ReportError> {
        let record = ReportRecord {
            category: report.category.as_str().to_string(),
            detail: report.detail.clone(),
            resource_id: report.resource_id.clone(),
            reported_at: self.clock.now(),
        };
        lock_storage(&self.storage)?.record_report(&record)?;
        Ok(())
    }
}

#[async_trait]
impl Reporter for StorageReporter {
    async fn report(&self, report: &Report) -> Result<(), ReportError> {
        TracingReporter.report(report).await?;
        self.persist(report)
    }
}
