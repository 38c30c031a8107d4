//! Storage traits and error types
//!
//! This module defines the trait interface for the backlog/result store and
//! associated error types.

use crate::crawler::CrawlOutcome;
use crate::state::CrawlStatus;
use crate::storage::{DomainRecord, PendingDomain, RunCounters, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Domain row not found: {0}")]
    DomainNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for backlog/result store implementations
///
/// Reads (pulling pending work) and writes (one outcome per row) are
/// independent calls; nothing spans several domains in one transaction.
pub trait Storage {
    // ===== Backlog =====

    /// Seeds the backlog with raw domain strings, skipping ones already present
    ///
    /// # Returns
    ///
    /// The number of newly inserted rows
    fn import_domains(&mut self, domains: &[String]) -> StorageResult<usize>;

    /// Returns up to `limit` rows whose status is `pending` or NULL
    fn fetch_pending(&self, limit: usize) -> StorageResult<Vec<PendingDomain>>;

    /// Gets a domain row by ID
    fn get_domain(&self, row_id: i64) -> StorageResult<DomainRecord>;

    // ===== Results =====

    /// Writes a crawl outcome: match lists, status, page count and timestamp
    fn record_outcome(&mut self, row_id: i64, outcome: &CrawlOutcome) -> StorageResult<()>;

    /// Minimal best-effort write of just the status and timestamp
    fn mark_status(&mut self, row_id: i64, status: CrawlStatus) -> StorageResult<()>;

    // ===== Run Management =====

    /// Creates a new run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: &RunCounters,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts rows per status (NULL counts as pending)
    fn count_by_status(&self) -> StorageResult<BTreeMap<CrawlStatus, u64>>;

    /// Gets total row count
    fn count_total_domains(&self) -> StorageResult<u64>;
}
