//! Error classification and directory pruning
//!
//! Maps external failure signals to a [`Signal`] and applies settled
//! dispositions:
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | `Throttled` | wait and retry (see `ThrottledCaller`) |
//! | `InvalidResource` | remove from directory, report |
//! | `PrivateResource` | remove from directory, report |
//! | `PermissionDenied` | report only |
//! | anything else | report with detail |

use crate::links::ApiError;
use crate::output::{report_quietly, Report, ReportCategory, Reporter};
use crate::storage::{lock_storage, SharedStorage, StorageResult};
use std::sync::Arc;
use std::time::Duration;

/// Why a resource was removed from the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    Invalid,
    Private,
}

/// What happens to a resource after a failed external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Permanently inaccessible; removed from the directory
    Pruned(PruneReason),

    /// Not allowed to act on the resource; kept in the directory
    PermissionDenied,

    /// Unknown failure; kept in the directory
    Failed(String),
}

impl Disposition {
    /// Whether the resource stays in the directory
    pub fn retains_resource(&self) -> bool {
        !matches!(self, Disposition::Pruned(_))
    }
}

/// Classification of a failed external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Transient; wait and try again
    Throttled { wait: Duration },

    /// Final for this call
    Settled(Disposition),
}

/// Classifies an external failure signal
pub fn classify(error: &ApiError) -> Signal {
    let disposition = match error {
        ApiError::Throttled { wait } => return Signal::Throttled { wait: *wait },
        ApiError::InvalidResource => Disposition::Pruned(PruneReason::Invalid),
        ApiError::PrivateResource => Disposition::Pruned(PruneReason::Private),
        ApiError::PermissionDenied => Disposition::PermissionDenied,
        ApiError::Other(detail) => Disposition::Failed(detail.clone()),
    };
    Signal::Settled(disposition)
}

/// Applies dispositions to the directory and the reporting sink
#[derive(Clone)]
pub struct Pruner {
    storage: SharedStorage,
    reporter: Arc<dyn Reporter>,
}

impl Pruner {
    pub fn new(storage: SharedStorage, reporter: Arc<dyn Reporter>) -> Self {
        Self { storage, reporter }
    }

    /// Acts on a settled disposition for `resource_id` and hands it back
    pub async fn apply(&self, resource_id: &str, disposition: Disposition) -> Disposition {
        match &disposition {
            Disposition::Pruned(reason) => {
                let (category, detail) = match reason {
                    PruneReason::Invalid => (
                        ReportCategory::ResourceInvalid,
                        "Resource no longer exists; removed from directory",
                    ),
                    PruneReason::Private => (
                        ReportCategory::ResourcePrivate,
                        "Resource became private; removed from directory",
                    ),
                };

                match self.remove(resource_id) {
                    Ok(true) => tracing::info!("Pruned resource {} ({:?})", resource_id, reason),
                    Ok(false) => tracing::debug!("Resource {} was already absent", resource_id),
                    Err(e) => tracing::warn!("Failed to prune resource {}: {}", resource_id, e),
                }

                self.report(category, detail.to_string(), resource_id).await;
            }
            Disposition::PermissionDenied => {
                self.report(
                    ReportCategory::PermissionDenied,
                    "Insufficient rights to issue a link".to_string(),
                    resource_id,
                )
                .await;
            }
            Disposition::Failed(detail) => {
                self.report(ReportCategory::ResourceError, detail.clone(), resource_id)
                    .await;
            }
        }

        disposition
    }

    fn remove(&self, resource_id: &str) -> StorageResult<bool> {
        lock_storage(&self.storage)?.remove(resource_id)
    }

    async fn report(&self, category: ReportCategory, detail: String, resource_id: &str) {
        let report = Report::new(category, detail).for_resource(resource_id);
        report_quietly(self.reporter.as_ref(), report).await;
    }
}
