//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Forge-Scout database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scout runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    domains_processed INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    persistence_failures INTEGER NOT NULL DEFAULT 0
);

-- Backlog and results, one row per raw domain string
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL UNIQUE,
    status TEXT DEFAULT 'pending',
    keywords TEXT,
    brands TEXT,
    plastics TEXT,
    metals TEXT,
    emails TEXT,
    pages_crawled INTEGER,
    scraped_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_domains_status ON domains(status);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "domains"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_new_rows_default_to_pending() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute("INSERT INTO domains (domain) VALUES ('acme.com')", [])
            .unwrap();

        let status: String = conn
            .query_row("SELECT status FROM domains", [], |row| row.get(0))
            .unwrap();
        assert_eq!(status, "pending");
    }
}
