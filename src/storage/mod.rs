//! Storage module for the domain backlog and crawl results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Seeding the backlog and pulling pending domains
//! - Writing one outcome per domain row
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::CrawlStatus;
use crate::ScoutError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScoutError> {
    SqliteStorage::new(path)
}

/// A backlog row awaiting a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDomain {
    pub id: i64,

    /// The raw domain string as stored, before normalization
    pub domain: String,
}

/// Represents a domain row in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    pub id: i64,
    pub domain: String,
    pub status: Option<CrawlStatus>,
    pub keywords: Vec<String>,
    pub brands: Vec<String>,
    pub plastics: Vec<String>,
    pub metals: Vec<String>,
    pub emails: Vec<String>,
    pub pages_crawled: Option<u64>,
    pub scraped_at: Option<String>,
}

/// Counters recorded on a run when it finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub domains_processed: u64,
    pub pages_crawled: u64,
    pub persistence_failures: u64,
}

/// Represents a scout run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counters: RunCounters,
}

/// Status of a scout run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
