//! Statistics from the directory database
//!
//! Backs the `--stats` command.

use crate::storage::Storage;
use crate::ChanfindError;

/// Directory statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryStatistics {
    /// Number of resources in the directory
    pub total_resources: u64,

    /// Number of resources that have a link on record
    pub cached_links: u64,

    /// Report counts by category, most frequent first
    pub reports_by_category: Vec<(String, u64)>,
}

impl DirectoryStatistics {
    /// Share of resources with a link on record, in percent
    pub fn cache_coverage(&self) -> f64 {
        if self.total_resources == 0 {
            0.0
        } else {
            (self.cached_links as f64 / self.total_resources as f64) * 100.0
        }
    }

    pub fn total_reports(&self) -> u64 {
        self.reports_by_category.iter().map(|(_, n)| n).sum()
    }
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<DirectoryStatistics, ChanfindError> {
    Ok(DirectoryStatistics {
        total_resources: storage.count_resources()?,
        cached_links: storage.count_cached_links()?,
        reports_by_category: storage.count_reports_by_category()?,
    })
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &DirectoryStatistics) {
    println!("=== Directory Statistics ===\n");

    println!("Overview:");
    println!("  Resources: {}", stats.total_resources);
    println!(
        "  Links on record: {} ({:.1}%)",
        stats.cached_links,
        stats.cache_coverage()
    );
    println!();

    if stats.reports_by_category.is_empty() {
        println!("No reports recorded.");
        return;
    }

    println!("Reports ({}):", stats.total_reports());
    for (category, count) in &stats.reports_by_category {
        println!("  {}: {}", category, count);
    }
}
