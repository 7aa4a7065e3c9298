//! Candidate resolver
//!
//! Scans the directory in fixed-size batches, scoring every candidate
//! against the normalized query and provisioning links only for the
//! candidates worth it.
//!
//! # Scan Rules
//!
//! - Batches follow directory order; within a batch candidates are
//!   considered one at a time, so on equal scores the first one seen wins
//! - A pause separates consecutive batches
//! - A provisioned candidate scoring above the early-exit threshold ends
//!   the scan immediately; no later candidate or batch is looked at
//! - The best match is only returned if it clears the report threshold

use crate::clock::Clock;
use crate::config::Config;
use crate::links::{ExternalApi, LinkProvisioner, Pruner, ThrottledCaller};
use crate::resolver::{Resolution, ResolvedMatch};
use crate::storage::{lock_storage, ResourceRecord, SharedStorage, StorageResult};
use crate::text::{normalize_title, score_match, MatchScore, Normalizer, Thresholds};
use crate::ChanfindError;
use std::sync::Arc;
use std::time::Duration;

/// Scan settings
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub batch_size: usize,
    pub batch_pause: Duration,
    pub min_query_length: usize,
    pub thresholds: Thresholds,
}

impl ScanSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.resolver.batch_size.max(1),
            batch_pause: Duration::from_millis(config.resolver.batch_pause_ms),
            min_query_length: config.resolver.min_query_length,
            thresholds: Thresholds::from_config(&config.resolver),
        }
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause: Duration::from_secs(1),
            min_query_length: 3,
            thresholds: Thresholds::default(),
        }
    }
}

/// State of one resolution call
#[derive(Debug)]
struct QueryContext {
    normalized: String,
    best: Option<ResolvedMatch>,
    early_exit: bool,
    scanned: usize,
}

impl QueryContext {
    fn new(normalized: String) -> Self {
        Self {
            normalized,
            best: None,
            early_exit: false,
            scanned: 0,
        }
    }

    /// Keeps `candidate` only if it strictly beats the current best
    fn offer(&mut self, candidate: ResolvedMatch) {
        let better = self
            .best
            .as_ref()
            .map_or(true, |best| candidate.score > best.score);
        if better {
            self.best = Some(candidate);
        }
    }
}

/// Resolves free-text queries to the best-matching directory entry
#[derive(Clone)]
pub struct CandidateResolver {
    storage: SharedStorage,
    api: Arc<dyn ExternalApi>,
    provisioner: LinkProvisioner,
    caller: ThrottledCaller,
    pruner: Pruner,
    normalizer: Normalizer,
    clock: Arc<dyn Clock>,
    settings: ScanSettings,
}

impl CandidateResolver {
    pub fn new(
        storage: SharedStorage,
        api: Arc<dyn ExternalApi>,
        provisioner: LinkProvisioner,
        caller: ThrottledCaller,
        pruner: Pruner,
        normalizer: Normalizer,
        clock: Arc<dyn Clock>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            storage,
            api,
            provisioner,
            caller,
            pruner,
            normalizer,
            clock,
            settings,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolves a raw query
    ///
    /// Only directory failures are returned as errors; every per-candidate
    /// failure is classified and the scan continues.
    pub async fn resolve(&self, raw_query: &str) -> Result<Resolution, ChanfindError> {
        let normalized = self.normalizer.normalize(raw_query);

        if self.normalizer.is_non_query(&normalized) {
            tracing::debug!("Ignoring non-query {:?}", raw_query);
            return Ok(Resolution::NotAQuery);
        }

        if normalized.chars().count() < self.settings.min_query_length {
            tracing::debug!("Query {:?} too short after normalization", normalized);
            return Ok(Resolution::NoMatch);
        }

        tracing::info!("Resolving query {:?}", normalized);
        let mut ctx = QueryContext::new(normalized);
        let mut after_seq = None;
        let mut batch_index = 0usize;

        loop {
            let batch = self.next_batch(after_seq)?;
            if batch.is_empty() {
                break;
            }

            if batch_index > 0 {
                self.clock.sleep(self.settings.batch_pause).await;
            }
            batch_index += 1;

            let batch_len = batch.len();
            after_seq = batch.last().map(|r| r.seq);
            tracing::debug!("Scanning batch {} ({} candidates)", batch_index, batch_len);

            for record in batch {
                self.consider(&mut ctx, record).await;
                if ctx.early_exit {
                    break;
                }
            }

            if ctx.early_exit || batch_len < self.settings.batch_size {
                break;
            }
        }

        Ok(self.finish(ctx))
    }

    fn next_batch(&self, after_seq: Option<i64>) -> StorageResult<Vec<ResourceRecord>> {
        lock_storage(&self.storage)?.list_page(after_seq, self.settings.batch_size)
    }

    async fn consider(&self, ctx: &mut QueryContext, record: ResourceRecord) {
        ctx.scanned += 1;

        let Some(title) = self.title_for(&record).await else {
            return;
        };

        let score: MatchScore = score_match(&ctx.normalized, &normalize_title(&title));
        tracing::debug!(
            "Candidate {} {:?}: combined {:.1} (token-sort {:.1}, partial {:.1}, keyword {})",
            record.id,
            title,
            score.combined,
            score.token_sort,
            score.partial,
            score.keyword_hit
        );

        if !self.settings.thresholds.accepts(&score) {
            return;
        }

        let Some(link) = self.provisioner.provision(&record.id).await else {
            return;
        };

        ctx.offer(ResolvedMatch {
            resource_id: record.id,
            title,
            link,
            score: score.combined,
        });

        if self.settings.thresholds.is_early_exit(score.combined) {
            tracing::debug!("Early exit at score {:.1}", score.combined);
            ctx.early_exit = true;
        }
    }

    /// Prefers the stored title; re-fetches and syncs it only when missing
    ///
    /// The fetch shares the rate budget and throttle back-off with link issuing.
    async fn title_for(&self, record: &ResourceRecord) -> Option<String> {
        if !record.title.trim().is_empty() {
            return Some(record.title.clone());
        }

        let api = self.api.as_ref();
        let id = record.id.as_str();
        let result = self
            .caller
            .call("title fetch", id, move || api.fetch_title(id))
            .await;

        match result {
            Ok(Ok(title)) => {
                if let Err(e) = self.sync_title(id, &title) {
                    tracing::warn!("Failed to sync title for {}: {}", id, e);
                }
                Some(title)
            }
            Ok(Err(disposition)) => {
                self.pruner.apply(id, disposition).await;
                None
            }
            Err(e) => {
                tracing::error!("Title fetch for {} aborted: {}", id, e);
                None
            }
        }
    }

    fn sync_title(&self, resource_id: &str, title: &str) -> StorageResult<()> {
        lock_storage(&self.storage)?.update_title(resource_id, title)
    }

    fn finish(&self, ctx: QueryContext) -> Resolution {
        match ctx.best {
            Some(best) if self.settings.thresholds.is_reportable(best.score) => {
                tracing::info!(
                    "Resolved {:?} to {:?} (score {:.1}, {} candidates scanned)",
                    ctx.normalized,
                    best.title,
                    best.score,
                    ctx.scanned
                );
                Resolution::Found(best)
            }
            _ => {
                tracing::info!(
                    "No match for {:?} ({} candidates scanned)",
                    ctx.normalized,
                    ctx.scanned
                );
                Resolution::NoMatch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, score: f64) -> ResolvedMatch {
        ResolvedMatch {
            resource_id: id.to_string(),
            title: id.to_string(),
            link: format!("https://t.me/+{}", id),
            score,
        }
    }

    #[test]
    fn test_offer_keeps_first_on_tie() {
        let mut ctx = QueryContext::new("q".to_string());
        ctx.offer(candidate("first", 75.0));
        ctx.offer(candidate("second", 75.0));
        assert_eq!(ctx.best.unwrap().resource_id, "first");
    }

    #[test]
    fn test_offer_replaces_on_strictly_greater() {
        let mut ctx = QueryContext::new("q".to_string());
        ctx.offer(candidate("low", 61.0));
        ctx.offer(candidate("high", 61.5));
        ctx.offer(candidate("lower", 40.0));
        assert_eq!(ctx.best.unwrap().resource_id, "high");
    }

    #[test]
    fn test_default_settings() {
        let settings = ScanSettings::default();
        assert_eq!(settings.batch_size, 5);
        assert_eq!(settings.min_query_length, 3);
        assert_eq!(settings.thresholds, Thresholds::default());
    }
}
