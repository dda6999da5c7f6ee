//! SQLite schema for the library cache
//!
//! The cache holds one CBOR-encoded record per reference. The JSON library
//! file remains the source of truth; this database is rebuilt from it.

use rusqlite::{Connection, OptionalExtension, Result};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// `schema_info` key holding the stamp of the library file the cache was built from
pub const SOURCE_STAMP_KEY: &str = "source_stamp";

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version and source stamp
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- One row per reference
        CREATE TABLE IF NOT EXISTS entries (
            label TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            year INTEGER NOT NULL,
            record BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_kind ON entries(kind);
        CREATE INDEX IF NOT EXISTS idx_entries_year ON entries(year);
        "#,
    )?;

    set_info(conn, "version", &SCHEMA_VERSION.to_string())
}

/// Read a `schema_info` value
pub fn get_info(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_info WHERE key = ?",
        [key],
        |row| row.get(0),
    )
    .optional()
}

/// Write a `schema_info` value
pub fn set_info(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES (?, ?)",
        [key, value],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    Ok(get_info(conn, "version")?.and_then(|v| v.parse().ok()))
}

/// Check if the schema needs to be (re)created
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v != SCHEMA_VERSION,
        _ => true,
    }
}
