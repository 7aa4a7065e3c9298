//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Chanfind database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Directory of resources; seq defines directory iteration order
CREATE TABLE IF NOT EXISTS resources (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    title_lower TEXT NOT NULL,
    link TEXT,
    link_issued_at INTEGER,
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_resources_title_lower ON resources(title_lower);

-- Conditions reported while resolving queries
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    detail TEXT NOT NULL,
    resource_id TEXT,
    reported_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_category ON reports(category);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
