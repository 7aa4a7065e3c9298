//! Spelling corrector
//!
//! Narrows a misspelled query to a directory title using the title search
//! index, then confirms the title against the live directory before
//! trusting it.

use crate::config::SpellCheckConfig;
use crate::storage::{lock_storage, ResourceRecord, SearchPage, SharedStorage, StorageResult};
use crate::text::normalize_title;
use std::collections::HashSet;

/// String closeness of two titles on a 0-100 scale
pub fn closeness(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b)) * 100.0
}

/// Bounded search for the directory title closest to a query
#[derive(Clone)]
pub struct SpellingCorrector {
    index: SharedStorage,
    directory: SharedStorage,
    max_rounds: u32,
    min_closeness: f64,
    page_size: usize,
}

impl SpellingCorrector {
    /// Creates a corrector
    ///
    /// `index` serves title searches and `directory` verifies the titles
    /// they produce. Both are usually the same store.
    pub fn new(index: SharedStorage, directory: SharedStorage, config: &SpellCheckConfig) -> Self {
        Self {
            index,
            directory,
            max_rounds: config.max_rounds,
            min_closeness: config.min_closeness,
            page_size: config.page_size.max(1),
        }
    }

    /// Returns the directory title the query most likely meant
    ///
    /// Each round looks at one page of search hits and picks the closest
    /// title not yet discarded:
    /// - closeness above the minimum and present in the directory → done
    /// - closeness above the minimum but absent → discarded, next round
    /// - otherwise → next page, or give up when there is none
    pub fn correct(&self, query: &str) -> StorageResult<Option<String>> {
        let query = normalize_title(query);
        if query.is_empty() {
            return Ok(None);
        }

        let mut cursor = 0u64;
        let mut discarded: HashSet<String> = HashSet::new();

        for round in 1..=self.max_rounds {
            let page = self.search(&query, cursor)?;

            match self.closest(&query, &page, &discarded) {
                Some((record, score)) if score > self.min_closeness => {
                    if self.verify(&record.title)? {
                        tracing::info!(
                            "Corrected {:?} to {:?} (closeness {:.1}, round {})",
                            query,
                            record.title,
                            score,
                            round
                        );
                        return Ok(Some(record.title.clone()));
                    }

                    tracing::debug!("Title {:?} no longer in directory; discarding", record.title);
                    discarded.insert(record.title.clone());
                }
                _ => match page.next_cursor {
                    Some(next) => cursor = next,
                    None => return Ok(None),
                },
            }
        }

        tracing::debug!("No correction for {:?} within {} rounds", query, self.max_rounds);
        Ok(None)
    }

    fn search(&self, query: &str, cursor: u64) -> StorageResult<SearchPage> {
        lock_storage(&self.index)?.search(query, cursor, self.page_size)
    }

    fn verify(&self, title: &str) -> StorageResult<bool> {
        Ok(lock_storage(&self.directory)?.find_by_title(title)?.is_some())
    }

    /// Closest non-discarded hit; the first one wins on equal closeness
    fn closest<'a>(
        &self,
        query: &str,
        page: &'a SearchPage,
        discarded: &HashSet<String>,
    ) -> Option<(&'a ResourceRecord, f64)> {
        let mut best: Option<(&ResourceRecord, f64)> = None;

        for record in page.records.iter().filter(|r| !discarded.contains(&r.title)) {
            let score = closeness(query, &record.title);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((record, score));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStorage, Storage};
    use std::sync::{Arc, Mutex};

    fn store(titles: &[(&str, &str)]) -> SharedStorage {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        for (id, title) in titles {
            storage.upsert_resource(id, title).unwrap();
        }
        Arc::new(Mutex::new(storage))
    }

    fn config() -> SpellCheckConfig {
        SpellCheckConfig::default()
    }

    #[test]
    fn test_closeness_identical_is_100() {
        assert_eq!(closeness("Night City News", "night city news"), 100.0);
    }

    #[test]
    fn test_corrects_single_typo() {
        let shared = store(&[("a", "Ocean Drive"), ("b", "Night City News")]);
        let corrector = SpellingCorrector::new(shared.clone(), shared, &config());

        let corrected = corrector.correct("night citty news").unwrap();
        assert_eq!(corrected.as_deref(), Some("Night City News"));
    }

    #[test]
    fn test_distant_query_is_not_corrected() {
        let shared = store(&[("a", "Night City News")]);
        let corrector = SpellingCorrector::new(shared.clone(), shared, &config());

        assert_eq!(corrector.correct("city").unwrap(), None);
    }

    #[test]
    fn test_stale_index_title_is_discarded() {
        // The index still knows a title the directory has dropped
        let index = store(&[("old", "Night City News"), ("new", "Night City Newz")]);
        let directory = store(&[("new", "Night City Newz")]);
        let corrector = SpellingCorrector::new(index, directory, &config());

        let corrected = corrector.correct("night city news").unwrap();
        assert_eq!(corrected.as_deref(), Some("Night City Newz"));
    }

    #[test]
    fn test_round_budget_is_respected() {
        let index = store(&[("old", "Night City News")]);
        let directory = store(&[]);
        let corrector = SpellingCorrector::new(
            index,
            directory,
            &SpellCheckConfig {
                max_rounds: 1,
                ..config()
            },
        );

        assert_eq!(corrector.correct("night city news").unwrap(), None);
    }

    #[test]
    fn test_empty_query() {
        let shared = store(&[("a", "Night City News")]);
        let corrector = SpellingCorrector::new(shared.clone(), shared, &config());
        assert_eq!(corrector.correct("   ").unwrap(), None);
    }
}
