//! Per-domain crawl controller
//!
//! Drives one domain through `Resolving -> Extracting -> PageLoop ->
//! Aggregating` and always produces exactly one [`CrawlOutcome`]. Every
//! failure below this point is turned into a status here.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::extract_internal_links;
use crate::crawler::resolver::{ResolveFailure, Resolver};
use crate::crawler::types::{CrawlOutcome, PageRecord};
use crate::detect::DetectionSet;
use crate::state::{CircuitLimits, CircuitState, CrawlStatus, StopReason};
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Crawls single domains; shared by all workers of a batch
pub struct DomainCrawler {
    fetcher: Arc<dyn PageFetcher>,
    resolver: Resolver,
    config: CrawlConfig,
}

impl DomainCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, resolver: Resolver, config: CrawlConfig) -> Self {
        Self {
            fetcher,
            resolver,
            config,
        }
    }

    /// Crawls one normalized domain
    ///
    /// The page loop stops early when the domain time budget is spent or
    /// after too many consecutive page failures; either way the pages
    /// gathered so far are aggregated. A fetch still in flight when the
    /// budget runs out is abandoned.
    pub async fn crawl(&self, domain: &str) -> CrawlOutcome {
        let jitter = self.jitter_delay();
        if !jitter.is_zero() {
            tokio::time::sleep(jitter).await;
        }

        let mut circuit = CircuitState::start();
        let limits = CircuitLimits::from_config(&self.config);

        let entry = match self.resolver.resolve(domain, self.fetcher.as_ref()).await {
            Ok(entry) => entry,
            Err(failure) => {
                tracing::debug!(domain = %domain, "Resolution failed: {}", failure);
                let status = match failure {
                    ResolveFailure::Blocked => CrawlStatus::Blocked,
                    ResolveFailure::Unreachable => CrawlStatus::Unreachable,
                };
                return CrawlOutcome::without_pages(domain, status);
            }
        };

        let candidates = match Url::parse(&entry.url) {
            Ok(base) => {
                extract_internal_links(&entry.page.html, &base, self.config.max_pages_per_domain)
            }
            Err(_) => Vec::new(),
        };
        tracing::debug!(
            domain = %domain,
            entry = %entry.url,
            candidates = candidates.len(),
            "Extracted internal links"
        );

        let mut pages = vec![entry.page];

        for link in candidates {
            if let Some(reason) = circuit.check(&limits) {
                log_early_stop(domain, reason, &circuit);
                break;
            }

            let remaining = circuit.remaining(limits.time_budget);
            match tokio::time::timeout(remaining, self.fetcher.fetch(&link)).await {
                Ok(Ok(page)) => {
                    circuit.record_success();
                    pages.push(page);
                }
                Ok(Err(failure)) => {
                    circuit.record_failure();
                    tracing::debug!(domain = %domain, url = %link, "Page failed: {}", failure);
                }
                Err(_) => {
                    log_early_stop(domain, StopReason::TimeBudget, &circuit);
                    break;
                }
            }
        }

        aggregate(domain, pages, self.config.track_emails)
    }

    fn jitter_delay(&self) -> Duration {
        let (min, max) = (self.config.jitter_min_ms, self.config.jitter_max_ms);
        let millis = if min >= max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        Duration::from_millis(millis)
    }
}

fn log_early_stop(domain: &str, reason: StopReason, circuit: &CircuitState) {
    tracing::debug!(
        domain = %domain,
        ?reason,
        elapsed_ms = circuit.elapsed().as_millis() as u64,
        failures = circuit.consecutive_failures,
        "Stopping page loop early"
    );
}

/// Unions page detections into the domain outcome
///
/// With e-mail tracking on, a domain with signals but no address is
/// `no_email`.
pub fn aggregate(domain: &str, pages: Vec<PageRecord>, track_emails: bool) -> CrawlOutcome {
    let pages_crawled = pages.len();
    let mut detections = DetectionSet::default();
    let mut emails = BTreeSet::new();

    for page in pages {
        detections.merge(page.detections);
        if track_emails {
            emails.extend(page.emails);
        }
    }

    let status = if !detections.has_signal() {
        CrawlStatus::NoSignal
    } else if track_emails && emails.is_empty() {
        CrawlStatus::NoEmail
    } else {
        CrawlStatus::Completed
    };

    CrawlOutcome {
        domain: domain.to_string(),
        detections,
        emails,
        status,
        pages_crawled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{MockFetcher, MockPage};

    fn crawl_config() -> CrawlConfig {
        CrawlConfig {
            jitter_min_ms: 0,
            jitter_max_ms: 0,
            ..CrawlConfig::default()
        }
    }

    fn crawler(fetcher: Arc<MockFetcher>, config: CrawlConfig) -> DomainCrawler {
        DomainCrawler::new(fetcher, Resolver::new(2, Duration::ZERO), config)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_acme_machining_end_to_end() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .page(
                    "https://www.acme-machining.com",
                    r#"<html><body><h1>CNC Machining</h1><p>Our Haas mills run 24/7.</p>
                       <a href="/services">Services</a></body></html>"#,
                )
                .page(
                    "https://www.acme-machining.com/services",
                    "<html><body><p>We also offer injection molding.</p></body></html>",
                ),
        );
        let outcome = crawler(fetcher.clone(), crawl_config())
            .crawl("acme-machining.com")
            .await;

        assert_eq!(outcome.detections.terms, set(&["cnc machining", "injection molding"]));
        assert_eq!(outcome.detections.brands, set(&["haas"]));
        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(outcome.pages_crawled, 2);
        assert_eq!(
            fetcher.requested(),
            vec![
                "https://acme-machining.com",
                "https://www.acme-machining.com",
                "https://www.acme-machining.com/services",
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_domain() {
        let fetcher = Arc::new(MockFetcher::new());
        let outcome = crawler(fetcher.clone(), crawl_config())
            .crawl("doesnotexist-xyz123.invalid")
            .await;

        assert_eq!(outcome.status, CrawlStatus::Unreachable);
        assert_eq!(outcome.pages_crawled, 0);
        assert_eq!(fetcher.calls(), 8);
    }

    #[tokio::test]
    async fn test_blocked_domain() {
        let mut mock = MockFetcher::new();
        for url in crate::url::url_variants("acme.com") {
            mock = mock.with(&url, MockPage::Status(403));
        }
        let outcome = crawler(Arc::new(mock), crawl_config()).crawl("acme.com").await;
        assert_eq!(outcome.status, CrawlStatus::Blocked);
        assert_eq!(outcome.pages_crawled, 0);
    }

    #[tokio::test]
    async fn test_no_signal() {
        let fetcher = Arc::new(
            MockFetcher::new().page("https://bakery.com", "<p>Fresh bread daily</p>"),
        );
        let outcome = crawler(fetcher, crawl_config()).crawl("bakery.com").await;
        assert_eq!(outcome.status, CrawlStatus::NoSignal);
        assert_eq!(outcome.pages_crawled, 1);
    }

    #[tokio::test]
    async fn test_circuit_breaker_stops_after_consecutive_failures() {
        let fetcher = Arc::new(MockFetcher::new().page(
            "https://acme.com",
            r#"<p>CNC machining</p>
               <a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
               <a href="/d">d</a><a href="/e">e</a>"#,
        ));
        let outcome = crawler(fetcher.clone(), crawl_config()).crawl("acme.com").await;

        assert_eq!(fetcher.calls(), 1 + 3);
        assert!(!fetcher.requested().contains(&"https://acme.com/d".to_string()));
        assert_eq!(outcome.pages_crawled, 1);
        assert_eq!(outcome.status, CrawlStatus::Completed);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let fetcher = Arc::new(
            MockFetcher::new()
                .page(
                    "https://acme.com",
                    r#"<a href="/a">a</a><a href="/b">b</a><a href="/ok">ok</a>
                       <a href="/c">c</a><a href="/d">d</a><a href="/e">e</a>"#,
                )
                .page("https://acme.com/ok", "<p>ABS parts</p>"),
        );
        let outcome = crawler(fetcher.clone(), crawl_config()).crawl("acme.com").await;

        assert_eq!(fetcher.calls(), 7);
        assert_eq!(outcome.pages_crawled, 2);
        assert_eq!(outcome.detections.plastics, set(&["abs"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_budget_abandons_slow_pages() {
        let slow = Duration::from_millis(700);
        let fetcher = Arc::new(
            MockFetcher::new()
                .page(
                    "https://acme.com",
                    r#"<p>CNC machining</p><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>"#,
                )
                .with("https://acme.com/a", MockPage::Slow(slow, "<p>6061</p>".into()))
                .with("https://acme.com/b", MockPage::Slow(slow, "<p>haas</p>".into()))
                .with("https://acme.com/c", MockPage::Slow(slow, "<p>abs</p>".into())),
        );
        let config = CrawlConfig {
            domain_time_budget_ms: 1_000,
            ..crawl_config()
        };
        let outcome = crawler(fetcher.clone(), config).crawl("acme.com").await;

        assert_eq!(outcome.pages_crawled, 2);
        assert_eq!(outcome.detections.metals, set(&["6061"]));
        assert!(outcome.detections.brands.is_empty());
        assert!(!fetcher.requested().contains(&"https://acme.com/c".to_string()));
        assert_eq!(outcome.status, CrawlStatus::Completed);
    }

    #[tokio::test]
    async fn test_page_cap_limits_fetches() {
        let mut html = String::from("<p>CNC machining</p>");
        for i in 0..30 {
            html.push_str(&format!(r#"<a href="/p{}">p</a>"#, i));
        }
        let mut mock = MockFetcher::new().page("https://acme.com", &html);
        for i in 0..30 {
            mock = mock.page(&format!("https://acme.com/p{}", i), "<p>page</p>");
        }
        let fetcher = Arc::new(mock);
        let config = CrawlConfig {
            max_pages_per_domain: 5,
            ..crawl_config()
        };
        let outcome = crawler(fetcher.clone(), config).crawl("acme.com").await;

        assert_eq!(fetcher.calls(), 6);
        assert_eq!(outcome.pages_crawled, 6);
    }

    #[tokio::test]
    async fn test_email_tracking_gates_status() {
        let config = CrawlConfig {
            track_emails: true,
            ..crawl_config()
        };

        let without = Arc::new(MockFetcher::new().page("https://acme.com", "<p>CNC machining</p>"));
        let outcome = crawler(without, config.clone()).crawl("acme.com").await;
        assert_eq!(outcome.status, CrawlStatus::NoEmail);

        let with = Arc::new(MockFetcher::new().page(
            "https://acme.com",
            r#"<p>CNC machining</p><a href="mailto:sales@acme.com">mail</a>"#,
        ));
        let outcome = crawler(with, config).crawl("acme.com").await;
        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(outcome.emails, set(&["sales@acme.com"]));
    }

    #[test]
    fn test_aggregate_ignores_emails_when_not_tracking() {
        let page = PageRecord {
            url: "https://acme.com".into(),
            final_url: "https://acme.com/".into(),
            html: String::new(),
            detections: DetectionSet {
                terms: set(&["cnc machining"]),
                ..Default::default()
            },
            emails: set(&["sales@acme.com"]),
        };
        let outcome = aggregate("acme.com", vec![page], false);
        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert!(outcome.emails.is_empty());
    }
}
