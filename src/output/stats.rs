//! Statistics generation from the result database
//!
//! This module provides functionality for extracting and displaying
//! backlog statistics from the storage layer.

use crate::state::CrawlStatus;
use crate::storage::{RunRecord, Storage};
use crate::ScoutError;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Backlog statistics summary
#[derive(Debug, Clone)]
pub struct BacklogStatistics {
    /// Total number of backlog rows
    pub total_domains: u64,

    /// Count of rows by status
    pub by_status: BTreeMap<CrawlStatus, u64>,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl BacklogStatistics {
    pub fn count(&self, status: CrawlStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Rows that carry a terminal status
    pub fn processed(&self) -> u64 {
        self.total_domains.saturating_sub(self.count(CrawlStatus::Pending))
    }

    /// Rows whose pages were crawled and classified
    pub fn classified(&self) -> u64 {
        self.sum_where(CrawlStatus::is_success)
    }

    /// Rows that could not be crawled at all
    pub fn failed(&self) -> u64 {
        self.sum_where(CrawlStatus::is_error)
    }

    fn sum_where(&self, predicate: impl Fn(&CrawlStatus) -> bool) -> u64 {
        self.by_status
            .iter()
            .filter(|(status, _)| predicate(*status))
            .map(|(_, count)| count)
            .sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(BacklogStatistics)` - Successfully loaded statistics
/// * `Err(ScoutError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<BacklogStatistics, ScoutError> {
    Ok(BacklogStatistics {
        total_domains: storage.count_total_domains()?,
        by_status: storage.count_by_status()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Renders statistics as a plain-text report
pub fn render_statistics(stats: &BacklogStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Backlog Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total domains: {}", stats.total_domains);
    let _ = writeln!(out, "  Processed: {}", stats.processed());
    let _ = writeln!(out, "    Classified: {}", stats.classified());
    let _ = writeln!(out, "    Failed: {}", stats.failed());
    let _ = writeln!(out, "  Pending: {}", stats.count(CrawlStatus::Pending));
    let _ = writeln!(out);

    let _ = writeln!(out, "Domains by Status:");
    let mut status_counts: Vec<_> = stats
        .by_status
        .iter()
        .filter(|(status, _)| status.is_terminal())
        .collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        let percentage = if stats.total_domains > 0 {
            (*count as f64 / stats.total_domains as f64) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "  {}: {} ({:.1}%)", status, count, percentage);
    }
    let _ = writeln!(out);

    if let Some(run) = &stats.latest_run {
        let _ = writeln!(out, "Latest Run:");
        let _ = writeln!(out, "  Run #{} ({})", run.id, run.status.to_db_string());
        let _ = writeln!(out, "  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            let _ = writeln!(out, "  Finished: {}", finished);
        }
        let _ = writeln!(
            out,
            "  Domains: {}, pages: {}, failed writes: {}",
            run.counters.domains_processed,
            run.counters.pages_crawled,
            run.counters.persistence_failures
        );
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BacklogStatistics) {
    print!("{}", render_statistics(stats));
}
