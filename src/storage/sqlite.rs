//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Match lists are stored as JSON arrays, or NULL when empty.

use crate::crawler::CrawlOutcome;
use crate::state::CrawlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DomainRecord, PendingDomain, RunCounters, RunRecord, RunStatus};
use crate::ScoutError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

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
    /// * `Err(ScoutError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScoutError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
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
    pub fn open_in_memory() -> Result<Self, ScoutError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn json_list(values: &BTreeSet<String>) -> StorageResult<Option<String>> {
    if values.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(values)?))
    }
}

fn parse_list(raw: Option<String>) -> StorageResult<Vec<String>> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}

fn read_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        counters: RunCounters {
            domains_processed: row.get::<_, i64>(5)? as u64,
            pages_crawled: row.get::<_, i64>(6)? as u64,
            persistence_failures: row.get::<_, i64>(7)? as u64,
        },
    })
}

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
                           domains_processed, pages_crawled, persistence_failures";

/// Raw column values of a `domains` row before JSON decoding
type DomainColumns = (
    i64,
    String,
    Option<String>,
    [Option<String>; 5],
    Option<i64>,
    Option<String>,
);

impl Storage for SqliteStorage {
    // ===== Backlog =====

    fn import_domains(&mut self, domains: &[String]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO domains (domain, status) VALUES (?1, 'pending')")?;
            for domain in domains {
                let domain = domain.trim();
                if domain.is_empty() {
                    continue;
                }
                inserted += stmt.execute(params![domain])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn fetch_pending(&self, limit: usize) -> StorageResult<Vec<PendingDomain>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, domain FROM domains
             WHERE status IS NULL OR status = 'pending'
             ORDER BY id LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(PendingDomain {
                    id: row.get(0)?,
                    domain: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn get_domain(&self, row_id: i64) -> StorageResult<DomainRecord> {
        let columns: Option<DomainColumns> = self
            .conn
            .query_row(
                "SELECT id, domain, status, keywords, brands, plastics, metals, emails,
                        pages_crawled, scraped_at
                 FROM domains WHERE id = ?1",
                params![row_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
                        row.get(8)?,
                        row.get(9)?,
                    ))
                },
            )
            .optional()?;

        let (id, domain, status, lists, pages_crawled, scraped_at) =
            columns.ok_or(StorageError::DomainNotFound(row_id))?;
        let [keywords, brands, plastics, metals, emails] = lists;

        Ok(DomainRecord {
            id,
            domain,
            status: status.as_deref().and_then(CrawlStatus::from_db_string),
            keywords: parse_list(keywords)?,
            brands: parse_list(brands)?,
            plastics: parse_list(plastics)?,
            metals: parse_list(metals)?,
            emails: parse_list(emails)?,
            pages_crawled: pages_crawled.map(|p| p as u64),
            scraped_at,
        })
    }

    // ===== Results =====

    fn record_outcome(&mut self, row_id: i64, outcome: &CrawlOutcome) -> StorageResult<()> {
        let detections = &outcome.detections;
        let now = Utc::now().to_rfc3339();

        let updated = self.conn.execute(
            "UPDATE domains
             SET status = ?1, keywords = ?2, brands = ?3, plastics = ?4, metals = ?5,
                 emails = ?6, pages_crawled = ?7, scraped_at = ?8
             WHERE id = ?9",
            params![
                outcome.status.to_db_string(),
                json_list(&detections.terms)?,
                json_list(&detections.brands)?,
                json_list(&detections.plastics)?,
                json_list(&detections.metals)?,
                json_list(&outcome.emails)?,
                outcome.pages_crawled as i64,
                now,
                row_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::DomainNotFound(row_id));
        }
        Ok(())
    }

    fn mark_status(&mut self, row_id: i64, status: CrawlStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE domains SET status = ?1, scraped_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, row_id],
        )?;

        if updated == 0 {
            return Err(StorageError::DomainNotFound(row_id));
        }
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                read_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                read_run,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: &RunCounters,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs
             SET status = ?1, finished_at = ?2, domains_processed = ?3,
                 pages_crawled = ?4, persistence_failures = ?5
             WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                counters.domains_processed as i64,
                counters.pages_crawled as i64,
                counters.persistence_failures as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_by_status(&self) -> StorageResult<BTreeMap<CrawlStatus, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(status, 'pending') AS s, COUNT(*) FROM domains GROUP BY s",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut counts = BTreeMap::new();
        for (status, count) in rows {
            match CrawlStatus::from_db_string(&status) {
                Some(status) => *counts.entry(status).or_insert(0) += count as u64,
                None => tracing::debug!("Ignoring unknown status '{}' in counts", status),
            }
        }
        Ok(counts)
    }

    fn count_total_domains(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM domains", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
