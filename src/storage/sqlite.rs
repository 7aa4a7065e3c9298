//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CachedLink, ReportRecord, ResourceRecord, SearchPage};
use crate::text::normalize_title;
use crate::ChanfindError;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const RESOURCE_COLUMNS: &str = "seq, id, title, link, link_issued_at";

/// Upper bound on the number of title fragments a search matches against
const MAX_SEARCH_FRAGMENTS: usize = 24;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ChanfindError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ChanfindError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, ChanfindError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ResourceRecord> {
    let link: Option<String> = row.get(3)?;
    let issued_at_ms: Option<i64> = row.get(4)?;

    Ok(ResourceRecord {
        seq: row.get(0)?,
        id: row.get(1)?,
        title: row.get(2)?,
        cached_link: to_cached_link(link, issued_at_ms),
    })
}

fn to_cached_link(link: Option<String>, issued_at_ms: Option<i64>) -> Option<CachedLink> {
    let (link, ms) = (link?, issued_at_ms?);
    let issued_at = Utc.timestamp_millis_opt(ms).single()?;
    Some(CachedLink { link, issued_at })
}

/// Splits search text into LIKE patterns: 3-character windows of every token
/// (shorter tokens are used whole), deduplicated and capped
fn search_patterns(text: &str) -> Vec<String> {
    let mut fragments: Vec<String> = Vec::new();

    for token in normalize_title(text).split_whitespace() {
        let chars: Vec<char> = token.chars().collect();
        let pieces: Vec<String> = if chars.len() <= 3 {
            vec![token.to_string()]
        } else {
            chars.windows(3).map(|w| w.iter().collect()).collect()
        };

        for piece in pieces {
            if !fragments.contains(&piece) {
                fragments.push(piece);
            }
        }
    }

    fragments.truncate(MAX_SEARCH_FRAGMENTS);
    fragments
        .into_iter()
        .map(|f| format!("%{}%", escape_like(&f)))
        .collect()
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Storage for SqliteStorage {
    // ===== Resource Management =====

    fn upsert_resource(&mut self, id: &str, title: &str) -> StorageResult<bool> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT seq FROM resources WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;

        if existing.is_some() {
            self.update_title(id, title)?;
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO resources (id, title, title_lower, added_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, title, normalize_title(title), now],
        )?;

        Ok(true)
    }

    fn update_title(&mut self, id: &str, title: &str) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE resources SET title = ?2, title_lower = ?3 WHERE id = ?1",
            params![id, title, normalize_title(title)],
        )?;

        if changed == 0 {
            return Err(StorageError::ResourceNotFound(id.to_string()));
        }
        Ok(())
    }

    fn remove(&mut self, id: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    // ===== Lookup =====

    fn find_by_id(&self, id: &str) -> StorageResult<Option<ResourceRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM resources WHERE id = ?1", RESOURCE_COLUMNS),
                params![id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn find_by_title(&self, title: &str) -> StorageResult<Option<ResourceRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM resources WHERE title_lower = ?1 ORDER BY seq LIMIT 1",
                    RESOURCE_COLUMNS
                ),
                params![normalize_title(title)],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_all(&self) -> StorageResult<Vec<ResourceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM resources ORDER BY seq",
            RESOURCE_COLUMNS
        ))?;

        let records = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn list_page(&self, after_seq: Option<i64>, limit: usize) -> StorageResult<Vec<ResourceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM resources WHERE seq > ?1 ORDER BY seq LIMIT ?2",
            RESOURCE_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![after_seq.unwrap_or(0), limit as i64], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn search(&self, text: &str, cursor: u64, limit: usize) -> StorageResult<SearchPage> {
        let patterns = search_patterns(text);
        if patterns.is_empty() {
            return Ok(SearchPage::default());
        }

        // Hits are ranked by how many fragments they contain
        let relevance = (1..=patterns.len())
            .map(|i| format!("(title_lower LIKE ?{} ESCAPE '\\')", i))
            .collect::<Vec<_>>()
            .join(" + ");

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM resources WHERE ({}) > 0", relevance),
            params_from_iter(patterns.iter()),
            |row| row.get(0),
        )?;

        let limit_param = patterns.len() + 1;
        let offset_param = patterns.len() + 2;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM resources WHERE ({rel}) > 0 ORDER BY ({rel}) DESC, seq LIMIT ?{} OFFSET ?{}",
            RESOURCE_COLUMNS,
            limit_param,
            offset_param,
            rel = relevance
        ))?;

        let mut values: Vec<Value> = patterns.into_iter().map(Value::Text).collect();
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(cursor as i64));

        let records = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        let total = total as u64;
        let next = cursor + records.len() as u64;
        let next_cursor = if !records.is_empty() && next < total {
            Some(next)
        } else {
            None
        };

        Ok(SearchPage {
            records,
            next_cursor,
            total,
        })
    }

    // ===== Link Cache =====

    fn get_cached_link(&self, id: &str) -> StorageResult<Option<CachedLink>> {
        let row: Option<(Option<String>, Option<i64>)> = self
            .conn
            .query_row(
                "SELECT link, link_issued_at FROM resources WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.and_then(|(link, ms)| to_cached_link(link, ms)))
    }

    fn store_link(&mut self, id: &str, link: &str, issued_at: DateTime<Utc>) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE resources
             SET link = ?2, link_issued_at = MAX(COALESCE(link_issued_at, ?3), ?3)
             WHERE id = ?1",
            params![id, link, issued_at.timestamp_millis()],
        )?;

        if changed == 0 {
            return Err(StorageError::ResourceNotFound(id.to_string()));
        }
        Ok(())
    }

    // ===== Reports =====

    fn record_report(&mut self, report: &ReportRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO reports (category, detail, resource_id, reported_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                report.category,
                report.detail,
                report.resource_id,
                report.reported_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn count_reports_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS count FROM reports GROUP BY category ORDER BY count DESC, category",
        )?;

        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    // ===== Statistics =====

    fn count_resources(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_cached_links(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM resources WHERE link IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
