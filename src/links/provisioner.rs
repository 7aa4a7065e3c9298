//! Link provisioning
//!
//! Obtains an access link for a resource: from the cache when fresh,
//! otherwise from the external API through the shared [`ThrottledCaller`].
//!
//! # Flow
//!
//! 1. Fresh cached link → return it, no outbound call
//! 2. Call `issue_link` under a budget slot, waiting out throttles
//! 3. Success → store in the cache, return the link
//! 4. Any other failure → hand to the [`Pruner`], return no link

use crate::links::{Disposition, ExternalApi, LinkCache, Pruner, ThrottledCaller};
use crate::output::{report_quietly, Report, ReportCategory, Reporter};
use crate::ChanfindError;
use std::sync::Arc;

/// Result of one provisioning attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Served from the link cache
    Cached(String),

    /// Freshly issued by the external API
    Issued(String),

    /// No link; the failure was classified and handled
    Skipped(Disposition),
}

impl ProvisionOutcome {
    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Cached(link) | Self::Issued(link) => Some(link),
            Self::Skipped(_) => None,
        }
    }

    pub fn into_link(self) -> Option<String> {
        match self {
            Self::Cached(link) | Self::Issued(link) => Some(link),
            Self::Skipped(_) => None,
        }
    }
}

/// Obtains access links, caching what the external API issues
#[derive(Clone)]
pub struct LinkProvisioner {
    api: Arc<dyn ExternalApi>,
    cache: LinkCache,
    caller: ThrottledCaller,
    pruner: Pruner,
    reporter: Arc<dyn Reporter>,
}

impl LinkProvisioner {
    pub fn new(
        api: Arc<dyn ExternalApi>,
        cache: LinkCache,
        caller: ThrottledCaller,
        pruner: Pruner,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            api,
            cache,
            caller,
            pruner,
            reporter,
        }
    }

    /// Returns a link for the resource, or `None` if it cannot be obtained
    pub async fn provision(&self, resource_id: &str) -> Option<String> {
        match self.provision_outcome(resource_id).await {
            Ok(outcome) => outcome.into_link(),
            Err(e) => {
                tracing::error!("Provisioning for {} aborted: {}", resource_id, e);
                None
            }
        }
    }

    /// Runs the provisioning flow and returns how it ended
    ///
    /// Only fails if the rate budget has been closed.
    pub async fn provision_outcome(&self, resource_id: &str) -> Result<ProvisionOutcome, ChanfindError> {
        match self.cache.get_fresh(resource_id) {
            Ok(Some(link)) => {
                tracing::debug!("Cache hit for {}", resource_id);
                return Ok(ProvisionOutcome::Cached(link));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Link cache read failed for {}: {}", resource_id, e),
        }

        let api = self.api.as_ref();
        let result = self
            .caller
            .call("link issue", resource_id, move || api.issue_link(resource_id))
            .await?;

        match result {
            Ok(link) => {
                self.store(resource_id, &link).await;
                tracing::info!("Issued new link for {}", resource_id);
                Ok(ProvisionOutcome::Issued(link))
            }
            Err(disposition) => {
                let disposition = self.pruner.apply(resource_id, disposition).await;
                Ok(ProvisionOutcome::Skipped(disposition))
            }
        }
    }

    async fn store(&self, resource_id: &str, link: &str) {
        if let Err(e) = self.cache.store(resource_id, link) {
            let report = Report::new(
                ReportCategory::CacheError,
                format!("Failed to cache issued link: {}", e),
            )
            .for_resource(resource_id);
            report_quietly(self.reporter.as_ref(), report).await;
        }
    }
}
