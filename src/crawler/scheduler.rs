//! Batch scheduler for the domain backlog
//!
//! This module handles:
//! - Pulling bounded slices of pending domains from storage
//! - Normalizing, de-duplicating and pre-validating them (no network)
//! - Running domain crawls under a global concurrency ceiling
//! - Persisting every outcome as it arrives and folding batch statistics
//!
//! Workers never touch storage or shared counters: each reports its outcome
//! over a channel and the scheduler does all writes and accounting.

use crate::config::SchedulerConfig;
use crate::crawler::controller::DomainCrawler;
use crate::crawler::types::{CrawlOutcome, DomainTask};
use crate::state::CrawlStatus;
use crate::storage::{PendingDomain, RunCounters, Storage};
use crate::url::prepare_domain;
use crate::{DomainError, ScoutError};
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Counters folded from worker reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    /// Outcomes produced (one per task, plus one per rejected row)
    pub domains: u64,

    /// Backlog rows pulled
    pub rows: u64,

    pub pages_crawled: u64,
    pub by_status: BTreeMap<CrawlStatus, u64>,

    /// Rows whose status was written, in full or by the fallback write
    pub persisted: u64,

    /// Full outcome writes that failed
    pub persistence_failures: u64,

    pub elapsed: Duration,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &CrawlOutcome) {
        self.domains += 1;
        self.pages_crawled += outcome.pages_crawled as u64;
        *self.by_status.entry(outcome.status).or_insert(0) += 1;
    }

    pub fn absorb(&mut self, other: &BatchStats) {
        self.domains += other.domains;
        self.rows += other.rows;
        self.pages_crawled += other.pages_crawled;
        for (status, count) in &other.by_status {
            *self.by_status.entry(*status).or_insert(0) += count;
        }
        self.persisted += other.persisted;
        self.persistence_failures += other.persistence_failures;
        self.elapsed += other.elapsed;
    }

    pub fn count(&self, status: CrawlStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn domains_per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.domains as f64 / minutes
        } else {
            0.0
        }
    }

    pub fn run_counters(&self) -> RunCounters {
        RunCounters {
            domains_processed: self.domains,
            pages_crawled: self.pages_crawled,
            persistence_failures: self.persistence_failures,
        }
    }
}

/// A backlog row rejected by the syntactic pre-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row_id: i64,
    pub raw: String,
    pub error: DomainError,
}

/// The crawl work derived from one pulled slice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub tasks: Vec<DomainTask>,
    pub rejected: Vec<RejectedRow>,
}

/// Normalizes and validates pulled rows
///
/// Rows that normalize to the same domain become one task carrying every
/// row id, in first-seen order.
pub fn plan_batch(rows: Vec<PendingDomain>) -> BatchPlan {
    let mut plan = BatchPlan::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let domain = match prepare_domain(&row.domain) {
            Ok(domain) => domain,
            Err(error) => {
                plan.rejected.push(RejectedRow {
                    row_id: row.id,
                    raw: row.domain,
                    error,
                });
                continue;
            }
        };

        match index.get(&domain) {
            Some(&i) => plan.tasks[i].row_ids.push(row.id),
            None => {
                index.insert(domain.clone(), plan.tasks.len());
                plan.tasks.push(DomainTask::new(domain, row.id));
            }
        }
    }

    plan
}

/// What a worker sends back when its crawl finishes
#[derive(Debug)]
struct WorkerReport {
    row_ids: Vec<i64>,
    outcome: CrawlOutcome,
}

/// Pulls pending domains in slices and crawls them with bounded concurrency
pub struct BatchScheduler<S> {
    storage: S,
    crawler: Arc<DomainCrawler>,
    config: SchedulerConfig,
}

impl<S: Storage> BatchScheduler<S> {
    pub fn new(storage: S, crawler: Arc<DomainCrawler>, config: SchedulerConfig) -> Self {
        Self {
            storage,
            crawler,
            config,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs one pass, or passes forever in continuous mode
    pub async fn run(&mut self) -> Result<BatchStats, ScoutError> {
        let mut total = BatchStats::default();

        loop {
            let pass = self.run_pass().await?;
            total.absorb(&pass);

            if !self.config.continuous {
                break;
            }

            tracing::info!(
                "Backlog drained; sleeping {}s before re-polling",
                self.config.check_interval_secs
            );
            tokio::time::sleep(self.config.check_interval()).await;
        }

        Ok(total)
    }

    /// Drains the backlog slice by slice until a pull returns nothing
    ///
    /// # Errors
    ///
    /// Fails if the backlog cannot be read, or with
    /// [`ScoutError::PersistenceStalled`] when no row of a slice could be
    /// written (the same rows would otherwise be pulled forever).
    pub async fn run_pass(&mut self) -> Result<BatchStats, ScoutError> {
        let mut total = BatchStats::default();
        let mut batch_number = 0u64;

        loop {
            let rows = self.storage.fetch_pending(self.config.batch_size)?;
            if rows.is_empty() {
                tracing::info!("No pending domains left");
                break;
            }

            batch_number += 1;
            tracing::info!("Batch {}: {} pending domains", batch_number, rows.len());

            let stats = self.run_batch(rows).await;
            log_batch(batch_number, &stats);

            if stats.rows > 0 && stats.persisted == 0 {
                return Err(ScoutError::PersistenceStalled {
                    domains: stats.rows as usize,
                });
            }
            total.absorb(&stats);

            let cooldown = self.config.batch_cooldown();
            if !cooldown.is_zero() {
                tokio::time::sleep(cooldown).await;
            }
        }

        Ok(total)
    }

    /// Crawls one slice to completion
    ///
    /// Rejected rows are written as `invalid` before any crawl starts and
    /// without any network call.
    pub async fn run_batch(&mut self, rows: Vec<PendingDomain>) -> BatchStats {
        let started = Instant::now();
        let mut stats = BatchStats {
            rows: rows.len() as u64,
            ..BatchStats::default()
        };

        let plan = plan_batch(rows);

        for rejected in plan.rejected {
            tracing::debug!(row = rejected.row_id, "Rejected domain: {}", rejected.error);
            let outcome = CrawlOutcome::without_pages(rejected.raw, CrawlStatus::Invalid);
            self.persist(&[rejected.row_id], &outcome, &mut stats);
            stats.record(&outcome);
        }

        let concurrency = self.config.concurrency.max(1);
        let (tx, mut rx) = mpsc::channel(concurrency);
        let dispatcher = tokio::spawn(dispatch(
            plan.tasks,
            Arc::clone(&self.crawler),
            concurrency,
            tx,
        ));

        while let Some(report) = rx.recv().await {
            tracing::info!(
                domain = %report.outcome.domain,
                status = %report.outcome.status,
                pages = report.outcome.pages_crawled,
                matches = report.outcome.detections.total_matches(),
                "Domain finished"
            );
            self.persist(&report.row_ids, &report.outcome, &mut stats);
            stats.record(&report.outcome);
        }

        if let Err(e) = dispatcher.await {
            tracing::error!("Batch dispatcher failed: {}", e);
        }

        stats.elapsed = started.elapsed();
        stats
    }

    /// Writes one outcome to every row of its task
    ///
    /// A failed write falls back to a status-only write and never aborts the
    /// batch.
    fn persist(&mut self, row_ids: &[i64], outcome: &CrawlOutcome, stats: &mut BatchStats) {
        for &row_id in row_ids {
            match self.storage.record_outcome(row_id, outcome) {
                Ok(()) => stats.persisted += 1,
                Err(e) => {
                    stats.persistence_failures += 1;
                    tracing::warn!(
                        domain = %outcome.domain,
                        row = row_id,
                        "Failed to write outcome: {}",
                        e
                    );
                    match self.storage.mark_status(row_id, outcome.status) {
                        Ok(()) => stats.persisted += 1,
                        Err(e) => tracing::warn!(
                            domain = %outcome.domain,
                            row = row_id,
                            "Fallback status write failed: {}",
                            e
                        ),
                    }
                }
            }
        }
    }
}

/// Spawns one worker per task, never more than `concurrency` at a time
async fn dispatch(
    tasks: Vec<DomainTask>,
    crawler: Arc<DomainCrawler>,
    concurrency: usize,
    tx: mpsc::Sender<WorkerReport>,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut workers = JoinSet::new();

    for task in tasks {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let crawler = Arc::clone(&crawler);
        let tx = tx.clone();

        workers.spawn(async move {
            let _permit = permit;
            let outcome = match AssertUnwindSafe(crawler.crawl(&task.domain))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    tracing::error!(
                        domain = %task.domain,
                        "Crawl worker panicked: {}",
                        panic_message(panic.as_ref())
                    );
                    CrawlOutcome::without_pages(task.domain.clone(), CrawlStatus::Error)
                }
            };

            if tx
                .send(WorkerReport {
                    row_ids: task.row_ids,
                    outcome,
                })
                .await
                .is_err()
            {
                tracing::warn!(domain = %task.domain, "Scheduler stopped before outcome was reported");
            }
        });
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Crawl worker task failed: {}", e);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn log_batch(batch_number: u64, stats: &BatchStats) {
    tracing::info!(
        "Batch {} done: {} domains, {} pages in {:.1}s ({:.1} domains/min); \
         completed={} no_signal={} no_email={} unreachable={} blocked={} invalid={} error={}",
        batch_number,
        stats.domains,
        stats.pages_crawled,
        stats.elapsed.as_secs_f64(),
        stats.domains_per_minute(),
        stats.count(CrawlStatus::Completed),
        stats.count(CrawlStatus::NoSignal),
        stats.count(CrawlStatus::NoEmail),
        stats.count(CrawlStatus::Unreachable),
        stats.count(CrawlStatus::Blocked),
        stats.count(CrawlStatus::Invalid),
        stats.count(CrawlStatus::Error),
    );
    if stats.persistence_failures > 0 {
        tracing::warn!(
            "Batch {}: {} outcome writes failed",
            batch_number,
            stats.persistence_failures
        );
    }
}
