//! Configuration module for Chanfind
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use chanfind::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("chanfind.toml")).unwrap();
//! println!("Scanning in batches of {}", config.resolver.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, DirectoryConfig, LinksConfig, ResolverConfig, SpellCheckConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
