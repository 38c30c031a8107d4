//! Values passed between the crawl stages

use crate::detect::DetectionSet;
use crate::state::CrawlStatus;
use serde::Serialize;
use std::collections::BTreeSet;

/// One unit of crawl work: a normalized domain and the backlog rows it came from
///
/// Several raw rows can normalize to the same domain; they share one crawl
/// and one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTask {
    pub domain: String,
    pub row_ids: Vec<i64>,
}

impl DomainTask {
    pub fn new(domain: impl Into<String>, row_id: i64) -> Self {
        Self {
            domain: domain.into(),
            row_ids: vec![row_id],
        }
    }
}

/// A fetched page with its detections
///
/// The HTML lives only as long as the domain crawl; it is never persisted.
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// The URL that was requested
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    pub html: String,
    pub detections: DetectionSet,

    /// Contact addresses, empty unless e-mail tracking is on
    pub emails: BTreeSet<String>,
}

/// The URL variant that answered for a domain, plus its entry page
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub domain: String,
    pub url: String,
    pub page: PageRecord,
}

/// Terminal result of crawling one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlOutcome {
    pub domain: String,
    pub detections: DetectionSet,
    pub emails: BTreeSet<String>,
    pub status: CrawlStatus,
    pub pages_crawled: usize,
}

impl CrawlOutcome {
    /// An outcome with no pages and no detections
    pub fn without_pages(domain: impl Into<String>, status: CrawlStatus) -> Self {
        Self {
            domain: domain.into(),
            detections: DetectionSet::default(),
            emails: BTreeSet::new(),
            status,
            pages_crawled: 0,
        }
    }
}
