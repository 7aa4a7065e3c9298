//! Chanfind: fuzzy channel lookup with cached access links
//!
//! This crate resolves a free-text query to the best-matching entry of a mutable
//! resource directory and returns a durable access link for it, caching links issued
//! by a rate-limited external API and pruning entries that become inaccessible.

pub mod clock;
pub mod config;
pub mod links;
pub mod output;
pub mod resolver;
pub mod storage;
pub mod text;

use thiserror::Error;

/// Main error type for Chanfind operations
#[derive(Debug, Error)]
pub enum ChanfindError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("External API error: {0}")]
    Api(#[from] links::ApiError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Rate budget closed")]
    BudgetClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Chanfind operations
pub type Result<T> = std::result::Result<T, ChanfindError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use resolver::{Finder, QueryOutcome, Resolution, ResolvedMatch};
pub use text::{normalize, score};
