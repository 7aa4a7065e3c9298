//! Output module
//!
//! This module handles what leaves the core:
//! - Reports of conditions found while resolving (logged and/or persisted)
//! - Replies rendered from query outcomes
//! - Directory statistics for the command line

mod reply;
mod report;
pub mod stats;

pub use reply::{
    render_reply, web_link, Button, Reply, DOWNLOAD_LABEL, NO_MATCH_TEXT, TEMPORARY_ISSUE_TEXT,
};
pub use report::{
    report_quietly, Report, ReportCategory, ReportError, Reporter, StorageReporter,
    TracingReporter,
};
pub use stats::{load_statistics, print_statistics, DirectoryStatistics};
