//! Query resolution module
//!
//! This module turns a raw query into an outcome:
//! - Candidate resolution over the directory (`coordinator`)
//! - Optional spelling correction when nothing matched (`corrector`)
//! - [`Finder`], the caller-facing entry point that never fails

mod coordinator;
mod corrector;

pub use coordinator::{CandidateResolver, ScanSettings};
pub use corrector::{closeness, SpellingCorrector};

use crate::clock::Clock;
use crate::config::Config;
use crate::links::{ExternalApi, LinkCache, LinkProvisioner, Pruner, RateBudget, ThrottledCaller};
use crate::output::{render_reply, report_quietly, Reply, Report, ReportCategory, Reporter};
use crate::storage::SharedStorage;
use crate::text::Normalizer;
use crate::ChanfindError;
use std::sync::Arc;
use std::time::Duration;

/// The entry a query resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub resource_id: String,
    pub title: String,
    pub link: String,
    /// Combined score (0-100)
    pub score: f64,
}

/// Result of one resolver pass
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedMatch),

    /// Nothing cleared the report threshold, or the query was too short
    NoMatch,

    /// Empty or generic text; not a search at all
    NotAQuery,
}

/// What the requester is told
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Match(ResolvedMatch),
    NoMatch,
    /// Send nothing
    Ignored,
    /// Resolution failed outside the handled failure classes
    TemporaryIssue,
}

/// Caller-facing query handler
#[derive(Clone)]
pub struct Finder {
    resolver: CandidateResolver,
    corrector: Option<SpellingCorrector>,
    reporter: Arc<dyn Reporter>,
    website_url: Option<String>,
}

impl Finder {
    pub fn new(
        resolver: CandidateResolver,
        corrector: Option<SpellingCorrector>,
        reporter: Arc<dyn Reporter>,
        website_url: Option<String>,
    ) -> Self {
        Self {
            resolver,
            corrector,
            reporter,
            website_url,
        }
    }

    /// Wires every service from configuration
    ///
    /// `budget` is the process-wide limiter; share one across finders.
    pub fn from_config(
        config: &Config,
        storage: SharedStorage,
        api: Arc<dyn ExternalApi>,
        reporter: Arc<dyn Reporter>,
        clock: Arc<dyn Clock>,
        budget: RateBudget,
    ) -> Self {
        let cache = LinkCache::new(
            storage.clone(),
            clock.clone(),
            Duration::from_secs(config.links.cache_ttl_secs),
        );
        let pruner = Pruner::new(storage.clone(), reporter.clone());
        let caller = ThrottledCaller::new(
            budget,
            clock.clone(),
            Duration::from_millis(config.links.throttle_margin_ms),
        );
        let provisioner = LinkProvisioner::new(
            api.clone(),
            cache,
            caller.clone(),
            pruner.clone(),
            reporter.clone(),
        );
        let resolver = CandidateResolver::new(
            storage.clone(),
            api,
            provisioner,
            caller,
            pruner,
            Normalizer::from_config(&config.resolver),
            clock,
            ScanSettings::from_config(config),
        );
        let corrector = config
            .spell_check
            .enabled
            .then(|| SpellingCorrector::new(storage.clone(), storage, &config.spell_check));

        Self::new(resolver, corrector, reporter, config.links.website_url.clone())
    }

    /// Resolves a query, reporting and absorbing unexpected failures
    pub async fn handle_query(&self, raw_query: &str) -> QueryOutcome {
        match self.run(raw_query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Query {:?} failed: {}", raw_query, e);
                report_quietly(
                    self.reporter.as_ref(),
                    Report::new(ReportCategory::SearchError, format!("Error in search: {}", e)),
                )
                .await;
                QueryOutcome::TemporaryIssue
            }
        }
    }

    /// Renders the reply for an outcome of this finder
    pub fn reply(&self, outcome: &QueryOutcome) -> Option<Reply> {
        render_reply(outcome, self.website_url.as_deref())
    }

    async fn run(&self, raw_query: &str) -> Result<QueryOutcome, ChanfindError> {
        match self.resolver.resolve(raw_query).await? {
            Resolution::Found(found) => Ok(QueryOutcome::Match(found)),
            Resolution::NotAQuery => Ok(QueryOutcome::Ignored),
            Resolution::NoMatch => self.retry_corrected(raw_query).await,
        }
    }

    /// One more pass with the corrected title, if a different one exists
    async fn retry_corrected(&self, raw_query: &str) -> Result<QueryOutcome, ChanfindError> {
        let Some(corrector) = &self.corrector else {
            return Ok(QueryOutcome::NoMatch);
        };

        let normalized = self.resolver.normalizer().normalize(raw_query);
        let Some(corrected) = corrector.correct(&normalized)? else {
            return Ok(QueryOutcome::NoMatch);
        };

        if self.resolver.normalizer().normalize(&corrected) == normalized {
            return Ok(QueryOutcome::NoMatch);
        }

        match self.resolver.resolve(&corrected).await? {
            Resolution::Found(found) => Ok(QueryOutcome::Match(found)),
            _ => Ok(QueryOutcome::NoMatch),
        }
    }
}
