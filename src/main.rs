//! Chanfind main entry point
//!
//! Command-line front end: directory administration, statistics, and
//! query resolution (one query from the arguments, or one per stdin line).

use anyhow::{Context, Result};
use chanfind::clock::{Clock, SystemClock};
use chanfind::config::{load_config_with_hash, Config};
use chanfind::links::{ExternalApi, HttpApi, RateBudget};
use chanfind::output::{load_statistics, print_statistics, Reporter, StorageReporter};
use chanfind::storage::{open_storage, SharedStorage, Storage};
use chanfind::{Finder, QueryOutcome};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Chanfind: fuzzy channel lookup with cached access links
///
/// Resolves free-text queries to the best-matching directory entry and
/// prints its access link. Without a QUERY, queries are read from stdin,
/// one per line.
#[derive(Parser, Debug)]
#[command(name = "chanfind")]
#[command(version)]
#[command(about = "Fuzzy channel lookup with cached access links", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Query to resolve
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without resolving anything
    #[arg(long, conflicts_with_all = ["stats", "list", "add", "remove"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["list", "add", "remove"])]
    stats: bool,

    /// List every directory entry and exit
    #[arg(long, conflicts_with_all = ["add", "remove"])]
    list: bool,

    /// Register a resource (or rename an existing one) and exit
    #[arg(long, num_args = 2, value_names = ["ID", "TITLE"], conflicts_with = "remove")]
    add: Option<Vec<String>>,

    /// Remove a resource from the directory and exit
    #[arg(long, value_name = "ID")]
    remove: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.list {
        handle_list(&config)?;
    } else if let Some(args) = &cli.add {
        handle_add(&config, &args[0], &args[1])?;
    } else if let Some(id) = &cli.remove {
        handle_remove(&config, id)?;
    } else {
        handle_queries(&config, cli.query.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("chanfind=info,warn"),
            1 => EnvFilter::new("chanfind=debug,info"),
            2 => EnvFilter::new("chanfind=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn open_directory(config: &Config) -> Result<chanfind::storage::SqliteStorage> {
    let path = Path::new(&config.directory.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles --dry-run: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Chanfind Dry Run ===\n");

    println!("Directory:");
    println!("  Database: {}", config.directory.database_path);

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!(
        "  Auth token: {}",
        if config.api.auth_token.is_some() { "set" } else { "none" }
    );
    println!("  Timeout: {}s", config.api.timeout_secs);

    println!("\nLinks:");
    println!("  Cache TTL: {}s", config.links.cache_ttl_secs);
    println!("  Rate budget: {}", config.links.rate_budget_capacity);
    println!("  Throttle margin: {}ms", config.links.throttle_margin_ms);
    if let Some(site) = &config.links.website_url {
        println!("  Website: {}", site);
    }

    println!("\nResolver:");
    println!(
        "  Batches of {} with {}ms pause",
        config.resolver.batch_size, config.resolver.batch_pause_ms
    );
    println!(
        "  Thresholds: accept > {}, early exit > {}, report > {}",
        config.resolver.acceptance_threshold,
        config.resolver.early_exit_threshold,
        config.resolver.report_threshold
    );
    println!("  Min query length: {}", config.resolver.min_query_length);
    println!("  Noise phrases: {}", config.resolver.noise_phrases.len());
    println!("  Generic tokens: {}", config.resolver.generic_tokens.len());

    println!("\nSpell check:");
    if config.spell_check.enabled {
        println!(
            "  Up to {} rounds, closeness > {}, {} hits per round",
            config.spell_check.max_rounds,
            config.spell_check.min_closeness,
            config.spell_check.page_size
        );
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.directory.database_path);
    let storage = open_directory(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);
    Ok(())
}

/// Handles --list
fn handle_list(config: &Config) -> Result<()> {
    let storage = open_directory(config)?;
    let records = storage.list_all()?;

    for record in &records {
        let link = record
            .cached_link
            .as_ref()
            .map(|c| c.link.as_str())
            .unwrap_or("-");
        println!("{}\t{}\t{}", record.id, record.title, link);
    }
    println!("\n{} resources", records.len());
    Ok(())
}

/// Handles --add ID TITLE
fn handle_add(config: &Config, id: &str, title: &str) -> Result<()> {
    let mut storage = open_directory(config)?;
    if storage.upsert_resource(id, title)? {
        println!("✓ Added {} ({})", id, title);
    } else {
        println!("✓ Renamed {} to {}", id, title);
    }
    Ok(())
}

/// Handles --remove ID
fn handle_remove(config: &Config, id: &str) -> Result<()> {
    let mut storage = open_directory(config)?;
    if storage.remove(id)? {
        println!("✓ Removed {}", id);
    } else {
        println!("{} was not in the directory", id);
    }
    Ok(())
}

/// Resolves the argument query, or every stdin line when there is none
async fn handle_queries(config: &Config, query: Option<&str>) -> Result<()> {
    let storage: SharedStorage = Arc::new(Mutex::new(open_directory(config)?));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let api: Arc<dyn ExternalApi> =
        Arc::new(HttpApi::new(&config.api).context("Failed to build API client")?);
    let reporter: Arc<dyn Reporter> = Arc::new(StorageReporter::new(storage.clone(), clock.clone()));
    let budget = RateBudget::new(config.links.rate_budget_capacity as usize);

    let finder = Finder::from_config(config, storage, api, reporter, clock, budget);

    if let Some(query) = query {
        answer(&finder, query).await;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        answer(&finder, &line).await;
    }
    Ok(())
}

async fn answer(finder: &Finder, query: &str) {
    let outcome = finder.handle_query(query).await;
    if let QueryOutcome::Match(found) = &outcome {
        tracing::debug!("Matched {} with score {:.1}", found.resource_id, found.score);
    }

    if let Some(reply) = finder.reply(&outcome) {
        println!("{}", reply.text);
        if let Some(button) = reply.button {
            println!("[{}] {}", button.label, button.url);
        }
    }
}
