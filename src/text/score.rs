//! Blended similarity scoring between a normalized query and a title
//!
//! The combined score mixes two sub-scores on a 0-100 scale:
//!
//! | Sub-score | Weight | Captures |
//! |-----------|--------|----------|
//! | Token-sort ratio | 0.7 | reordered words |
//! | Partial ratio | 0.3 | prefixes and partial titles |
//!
//! Both sub-scores are built on an indel similarity ratio:
//! `200 * LCS(a, b) / (len(a) + len(b))`.

use crate::config::ResolverConfig;
use rapidfuzz::distance::indel;

/// Weight of the order-invariant sub-score
pub const TOKEN_SORT_WEIGHT: f64 = 0.7;

/// Weight of the substring containment sub-score
pub const PARTIAL_WEIGHT: f64 = 0.3;

/// Query tokens must be longer than this to count as a keyword hit
const KEYWORD_MIN_CHARS: usize = 2;

/// Score breakdown for one query/title pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Blended score used for ranking (0-100)
    pub combined: f64,

    /// Similarity after sorting each side's tokens
    pub token_sort: f64,

    /// Best alignment of the shorter string inside the longer one
    pub partial: f64,

    /// A query token longer than two characters appears literally in the title
    pub keyword_hit: bool,
}

/// Scores a normalized query against a normalized title
///
/// # Examples
///
/// ```
/// use chanfind::text::score;
///
/// assert_eq!(score("night city news", "night city news"), 100.0);
/// assert!(score("xyz", "night city news") < 60.0);
/// ```
pub fn score(query: &str, title: &str) -> f64 {
    score_match(query, title).combined
}

/// Scores a normalized query against a normalized title, keeping the breakdown
pub fn score_match(query: &str, title: &str) -> MatchScore {
    let token_sort = token_sort_ratio(query, title);
    let partial = partial_ratio(query, title);
    let combined = (TOKEN_SORT_WEIGHT * token_sort + PARTIAL_WEIGHT * partial).clamp(0.0, 100.0);

    MatchScore {
        combined,
        token_sort,
        partial,
        keyword_hit: keyword_hit(query, title),
    }
}

/// Indel similarity of two strings (0-100)
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Similarity after sorting the whitespace-delimited tokens of each side
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Best similarity of the shorter string against every same-length window of the longer
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if shorter.is_empty() {
        return if longer.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best = 0.0;
    for window in longer.windows(shorter.len()) {
        let r = ratio_chars(&shorter, window);
        if r > best {
            best = r;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Returns true if any query token longer than two characters occurs in the title
pub fn keyword_hit(query: &str, title: &str) -> bool {
    query
        .split_whitespace()
        .any(|token| token.chars().count() > KEYWORD_MIN_CHARS && title.contains(token))
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    indel::normalized_similarity(a.iter().copied(), b.iter().copied()) * 100.0
}

/// Score thresholds applied by the resolver
///
/// All comparisons are strict: a score equal to a threshold does not pass it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// A candidate above this score is worth provisioning a link for
    pub acceptance: f64,

    /// A provisioned candidate above this score ends the scan
    pub early_exit: f64,

    /// The final best match must be above this score to be returned
    pub report: f64,
}

impl Thresholds {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            acceptance: config.acceptance_threshold,
            early_exit: config.early_exit_threshold,
            report: config.report_threshold,
        }
    }

    /// A keyword hit qualifies a candidate regardless of its numeric score
    pub fn accepts(&self, score: &MatchScore) -> bool {
        score.combined > self.acceptance || score.keyword_hit
    }

    pub fn is_early_exit(&self, combined: f64) -> bool {
        combined > self.early_exit
    }

    pub fn is_reportable(&self, combined: f64) -> bool {
        combined > self.report
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            acceptance: 60.0,
            early_exit: 90.0,
            report: 60.0,
        }
    }
}
