use serde::Deserialize;

/// Main configuration structure for Chanfind
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub directory: DirectoryConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(rename = "spell-check", default)]
    pub spell_check: SpellCheckConfig,
}

/// Directory store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// External link-issuing API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API (e.g., "https://api.example.com/v1")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(rename = "auth-token", default)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Link cache and provisioning configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    /// How long an issued link is served from cache (seconds)
    #[serde(rename = "cache-ttl-secs", default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of concurrent outbound link requests
    #[serde(rename = "rate-budget-capacity", default = "default_rate_budget_capacity")]
    pub rate_budget_capacity: u32,

    /// Extra wait added on top of every throttle signal (milliseconds)
    #[serde(rename = "throttle-margin-ms", default = "default_throttle_margin_ms")]
    pub throttle_margin_ms: u64,

    /// Public landing page that deep links are rewritten to
    #[serde(rename = "website-url", default)]
    pub website_url: Option<String>,
}

/// Candidate resolver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Number of directory entries scored per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (milliseconds)
    #[serde(rename = "batch-pause-ms", default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,

    /// Score a candidate must exceed before a link is provisioned for it
    #[serde(rename = "acceptance-threshold", default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Score that ends the directory scan immediately
    #[serde(rename = "early-exit-threshold", default = "default_early_exit_threshold")]
    pub early_exit_threshold: f64,

    /// Score the final best match must exceed to be returned
    #[serde(rename = "report-threshold", default = "default_report_threshold")]
    pub report_threshold: f64,

    /// Normalized queries shorter than this are rejected
    #[serde(rename = "min-query-length", default = "default_min_query_length")]
    pub min_query_length: usize,

    /// Phrases stripped from queries before matching
    #[serde(rename = "noise-phrases", default)]
    pub noise_phrases: Vec<String>,

    /// Queries equal to one of these after stripping are not treated as queries
    #[serde(rename = "generic-tokens", default)]
    pub generic_tokens: Vec<String>,
}

/// Spelling corrector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SpellCheckConfig {
    /// Whether to retry unmatched queries with a corrected title
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of refinement rounds
    #[serde(rename = "max-rounds", default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Closeness (0-100) a title must exceed to be accepted
    #[serde(rename = "min-closeness", default = "default_min_closeness")]
    pub min_closeness: f64,

    /// Number of search hits fetched per round
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_rate_budget_capacity() -> u32 {
    3
}

fn default_throttle_margin_ms() -> u64 {
    1_000
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause_ms() -> u64 {
    1_000
}

fn default_acceptance_threshold() -> f64 {
    60.0
}

fn default_early_exit_threshold() -> f64 {
    90.0
}

fn default_report_threshold() -> f64 {
    60.0
}

fn default_min_query_length() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_max_rounds() -> u32 {
    5
}

fn default_min_closeness() -> f64 {
    80.0
}

fn default_page_size() -> usize {
    20
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            rate_budget_capacity: default_rate_budget_capacity(),
            throttle_margin_ms: default_throttle_margin_ms(),
            website_url: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause_ms(),
            acceptance_threshold: default_acceptance_threshold(),
            early_exit_threshold: default_early_exit_threshold(),
            report_threshold: default_report_threshold(),
            min_query_length: default_min_query_length(),
            noise_phrases: Vec::new(),
            generic_tokens: Vec::new(),
        }
    }
}

impl Default for SpellCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rounds: default_max_rounds(),
            min_closeness: default_min_closeness(),
            page_size: default_page_size(),
        }
    }
}
