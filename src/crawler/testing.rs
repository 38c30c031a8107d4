//! In-memory page fetcher for crawl tests

use crate::crawler::fetcher::{FetchFailure, PageFetcher, TransportError};
use crate::crawler::types::PageRecord;
use crate::detect::{page_text, Detector, Vocabulary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub(crate) enum MockPage {
    Html(String),
    Status(u16),
    Slow(Duration, String),
    Panic,
}

/// Serves canned pages by exact URL; unknown URLs fail to connect
pub(crate) struct MockFetcher {
    pages: HashMap<String, MockPage>,
    detector: Detector,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        let vocabulary = Vocabulary::new(
            &["cnc machining", "injection molding"],
            &["haas"],
            &["abs"],
            &["6061"],
        );
        Self {
            pages: HashMap::new(),
            detector: Detector::new(&vocabulary).unwrap(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn page(self, url: &str, html: &str) -> Self {
        self.with(url, MockPage::Html(html.to_string()))
    }

    pub(crate) fn with(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    fn record(&self, url: &str, html: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            final_url: url.to_string(),
            html: html.to_string(),
            detections: self.detector.detect(&page_text(html), url),
            emails: self.detector.emails(html),
        }
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<PageRecord, FetchFailure> {
        self.requested.lock().unwrap().push(url.to_string());

        match self.pages.get(url) {
            Some(MockPage::Html(html)) => Ok(self.record(url, html)),
            Some(MockPage::Status(status)) => Err(FetchFailure::Http {
                status: *status,
                attempts: 1,
            }),
            Some(MockPage::Slow(delay, html)) => {
                tokio::time::sleep(*delay).await;
                Ok(self.record(url, html))
            }
            Some(MockPage::Panic) => panic!("fetcher fault for {}", url),
            None => Err(FetchFailure::Network {
                error: TransportError::Connect(format!("{}: connection refused", url)),
                attempts: 1,
            }),
        }
    }
}
