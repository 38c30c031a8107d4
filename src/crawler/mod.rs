//! Crawler module for domain resolution, page sampling and batch scheduling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry
//! - Internal link extraction
//! - URL variant resolution
//! - The per-domain crawl controller with its circuit breaker
//! - The batch scheduler and its worker pool

mod controller;
mod fetcher;
mod parser;
mod resolver;
mod scheduler;
mod types;

#[cfg(test)]
mod testing;

pub use controller::{aggregate, DomainCrawler};
pub use fetcher::{
    build_http_client, FailureClass, FetchFailure, PageFetcher, RawResponse, ReqwestTransport,
    RetryPolicy, RetryingFetcher, Transport, TransportError,
};
pub use parser::{extract_internal_links, extract_links};
pub use resolver::{ResolveFailure, Resolver};
pub use scheduler::{plan_batch, BatchPlan, BatchScheduler, BatchStats, RejectedRow};
pub use types::{CrawlOutcome, DomainTask, PageRecord, ResolvedEntry};

use crate::config::Config;
use crate::detect::Detector;
use crate::storage::{RunStatus, SqliteStorage, Storage};
use crate::ScoutError;
use std::path::Path;
use std::sync::Arc;

/// Wires the HTTP transport, retry policy and resolver into a crawler
pub fn build_crawler(config: &Config, detector: Arc<Detector>) -> Result<DomainCrawler, ScoutError> {
    let transport = ReqwestTransport::new(&config.fetch)?;
    let fetcher = RetryingFetcher::new(
        transport,
        RetryPolicy::from_config(&config.fetch),
        detector,
        config.crawl.track_emails,
    );

    Ok(DomainCrawler::new(
        Arc::new(fetcher),
        Resolver::from_config(&config.resolver),
        config.crawl.clone(),
    ))
}

/// Runs the scheduler against the configured database
///
/// This is the main entry point for a scouting run. It will:
/// 1. Open the result store and record a new run
/// 2. Build the shared HTTP client and crawler
/// 3. Drain the backlog (or poll forever in continuous mode)
/// 4. Close the run with its counters
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `detector` - The compiled detector shared by every worker
/// * `config_hash` - Hash of the configuration file, recorded on the run
pub async fn run_scout(
    config: &Config,
    detector: Arc<Detector>,
    config_hash: &str,
) -> Result<BatchStats, ScoutError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash)?;
    tracing::info!("Starting run {}", run_id);

    let crawler = Arc::new(build_crawler(config, detector)?);
    let mut scheduler = BatchScheduler::new(storage, crawler, config.scheduler.clone());
    let result = scheduler.run().await;

    let (status, counters) = match &result {
        Ok(stats) => (RunStatus::Completed, stats.run_counters()),
        Err(_) => (RunStatus::Failed, Default::default()),
    };
    if let Err(e) = scheduler.storage_mut().finish_run(run_id, status, &counters) {
        tracing::warn!("Failed to close run {}: {}", run_id, e);
    }

    let stats = result?;
    tracing::info!(
        "Run {} finished: {} domains, {} pages, {:.1} domains/min",
        run_id,
        stats.domains,
        stats.pages_crawled,
        stats.domains_per_minute()
    );
    Ok(stats)
}
