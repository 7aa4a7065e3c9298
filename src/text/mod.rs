//! Text handling module
//!
//! This module provides query canonicalization and the blended similarity
//! score used to rank directory titles against a query.

mod normalize;
mod score;

pub use normalize::{normalize, normalize_title, Normalizer};
pub use score::{
    keyword_hit, partial_ratio, ratio, score, score_match, token_sort_ratio, MatchScore,
    Thresholds, PARTIAL_WEIGHT, TOKEN_SORT_WEIGHT,
};
