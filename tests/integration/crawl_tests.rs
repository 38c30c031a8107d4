//! Integration tests for the crawler
//!
//! These tests use wiremock to serve real HTTP responses and drive the
//! fetcher, the domain crawler and the batch scheduler end-to-end.

use async_trait::async_trait;
use forge_scout::config::{CrawlConfig, FetchConfig, ResolverConfig, SchedulerConfig};
use forge_scout::crawler::{
    BatchScheduler, DomainCrawler, FetchFailure, PageFetcher, RawResponse, ReqwestTransport,
    Resolver, RetryPolicy, RetryingFetcher, Transport, TransportError,
};
use forge_scout::detect::{Detector, Vocabulary};
use forge_scout::storage::{RunCounters, RunStatus, SqliteStorage, Storage};
use forge_scout::CrawlStatus;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetch settings with every retry delay zeroed
fn fetch_config() -> FetchConfig {
    FetchConfig {
        connect_timeout_ms: 2_000,
        request_timeout_ms: 5_000,
        retry_timeout_ms: 5_000,
        rate_limit_cooldown_ms: 0,
        server_error_cooldown_ms: 0,
        client_error_delay_ms: 0,
        network_retry_delay_ms: 0,
        user_agents: vec!["ForgeScoutTest/1.0".to_string()],
        accept_language: "en-US".to_string(),
        ..FetchConfig::default()
    }
}

fn detector() -> Arc<Detector> {
    let vocabulary = Vocabulary::new(
        &["cnc machining", "injection molding"],
        &["haas"],
        &["abs"],
        &["6061"],
    );
    Arc::new(Detector::new(&vocabulary).expect("Failed to compile vocabulary"))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Sends every request to the mock server, keyed by host
///
/// `https://www.acme.com/services` becomes `{server}/acme.com/services`, so
/// any number of fake domains can be served by one local server.
struct LocalTransport {
    inner: ReqwestTransport,
    server: String,
}

#[async_trait]
impl Transport for LocalTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::Other(e.to_string()))?;
        let host = parsed.host_str().unwrap_or_default();
        let host = host.strip_prefix("www.").unwrap_or(host);
        let local = format!("{}/{}{}", self.server, host, parsed.path());
        self.inner.get(&local, timeout).await
    }
}

fn local_crawler(server: &MockServer, track_emails: bool) -> Arc<DomainCrawler> {
    let config = fetch_config();
    let transport = LocalTransport {
        inner: ReqwestTransport::new(&config).expect("Failed to build client"),
        server: server.uri(),
    };
    let fetcher = RetryingFetcher::new(
        transport,
        RetryPolicy::from_config(&config),
        detector(),
        track_emails,
    );

    let resolver = Resolver::from_config(&ResolverConfig {
        passes: 1,
        pass_delay_ms: 0,
    });
    let crawl = CrawlConfig {
        jitter_min_ms: 0,
        jitter_max_ms: 0,
        track_emails,
        ..CrawlConfig::default()
    };

    Arc::new(DomainCrawler::new(Arc::new(fetcher), resolver, crawl))
}

fn direct_fetcher() -> RetryingFetcher<ReqwestTransport> {
    let config = fetch_config();
    RetryingFetcher::new(
        ReqwestTransport::new(&config).expect("Failed to build client"),
        RetryPolicy::from_config(&config),
        detector(),
        true,
    )
}

#[tokio::test]
async fn test_fetch_detects_terms_and_sends_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "ForgeScoutTest/1.0"))
        .and(header("accept-language", "en-US"))
        .respond_with(html(
            "<h1>CNC Machining</h1><p>HAAS mills, 6061 and ABS</p>\
             <a href=\"mailto:quotes@acme.com\">Quote</a>",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    let page = direct_fetcher().fetch(&url).await.expect("Fetch failed");

    assert!(page.detections.terms.contains("cnc machining"));
    assert!(page.detections.brands.contains("haas"));
    assert!(page.detections.plastics.contains("abs"));
    assert!(page.detections.metals.contains("6061"));
    assert!(page.emails.contains("quotes@acme.com"));
}

#[tokio::test]
async fn test_fetch_retries_after_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>injection molding</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    let page = direct_fetcher().fetch(&url).await.expect("Fetch failed");

    assert!(page.detections.terms.contains("injection molding"));
}

#[tokio::test]
async fn test_fetch_gives_up_on_server_errors() {
    let mock_server = MockServer::start().await;

    // One attempt plus one retry
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    let failure = direct_fetcher().fetch(&url).await.unwrap_err();

    assert_eq!(
        failure,
        FetchFailure::Http {
            status: 503,
            attempts: 2
        }
    );
}

#[tokio::test]
async fn test_fetch_forbidden_is_blocking() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/", mock_server.uri());
    let failure = direct_fetcher().fetch(&url).await.unwrap_err();

    assert!(failure.is_blocking());
    assert_eq!(failure.attempts(), 2);
}

#[tokio::test]
async fn test_crawl_samples_internal_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme-tooling.com/"))
        .respond_with(html(
            r#"<h1>Acme Tooling</h1>
            <a href="/services">Services</a>
            <a href="https://www.acme-tooling.com/materials?ref=nav">Materials</a>
            <a href="https://supplier.example.com/catalog">Supplier</a>
            <a href="mailto:sales@acme-tooling.com">Contact</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme-tooling.com/services"))
        .respond_with(html("<p>CNC machining on Haas VF-2 mills</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme-tooling.com/materials"))
        .respond_with(html("<p>6061 aluminum, ABS</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = local_crawler(&mock_server, true)
        .crawl("acme-tooling.com")
        .await;

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.pages_crawled, 3);
    assert!(outcome.detections.terms.contains("cnc machining"));
    assert!(outcome.detections.brands.contains("haas"));
    assert!(outcome.detections.plastics.contains("abs"));
    assert!(outcome.detections.metals.contains("6061"));
    assert!(outcome.emails.contains("sales@acme-tooling.com"));
}

#[tokio::test]
async fn test_scheduler_run_writes_every_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme-tooling.com/"))
        .respond_with(html(
            r#"<p>Injection molding in ABS</p><a href="/contact">Contact</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/acme-tooling.com/contact"))
        .respond_with(html("<p>Write to info@acme-tooling.com</p>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/corner-bakery.com/"))
        .respond_with(html("<p>Fresh bread every morning</p>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/guarded-works\.com/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    // gone-dark.com has no mocks; every variant answers 404

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("scout.db");

    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let backlog: Vec<String> = [
        "https://www.acme-tooling.com/",
        "ACME-TOOLING.COM",
        "corner-bakery.com",
        "guarded-works.com",
        "gone-dark.com",
        "n/a",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect();
    assert_eq!(storage.import_domains(&backlog).expect("Import failed"), 6);
    let run_id = storage.create_run("test-hash").expect("Failed to create run");

    let config = SchedulerConfig {
        batch_size: 4,
        concurrency: 3,
        batch_cooldown_ms: 0,
        continuous: false,
        ..SchedulerConfig::default()
    };
    let mut scheduler = BatchScheduler::new(storage, local_crawler(&mock_server, true), config);
    let stats = scheduler.run().await.expect("Run failed");

    // The two acme rows share one crawl
    assert_eq!(stats.rows, 6);
    assert_eq!(stats.domains, 5);
    assert_eq!(stats.persisted, 6);
    assert_eq!(stats.persistence_failures, 0);

    let mut storage = scheduler.into_storage();
    storage
        .finish_run(run_id, RunStatus::Completed, &stats.run_counters())
        .expect("Failed to finish run");

    let status_of = |id: i64| storage.get_domain(id).expect("Missing row").status;
    assert_eq!(status_of(1), Some(CrawlStatus::Completed));
    assert_eq!(status_of(2), Some(CrawlStatus::Completed));
    assert_eq!(status_of(3), Some(CrawlStatus::NoSignal));
    assert_eq!(status_of(4), Some(CrawlStatus::Blocked));
    assert_eq!(status_of(5), Some(CrawlStatus::Unreachable));
    assert_eq!(status_of(6), Some(CrawlStatus::Invalid));

    let acme = storage.get_domain(1).expect("Missing row");
    assert_eq!(acme.keywords, vec!["injection molding".to_string()]);
    assert_eq!(acme.plastics, vec!["abs".to_string()]);
    assert_eq!(acme.emails, vec!["info@acme-tooling.com".to_string()]);
    assert_eq!(acme.pages_crawled, Some(2));
    assert!(acme.scraped_at.is_some());

    assert!(storage.fetch_pending(10).expect("Query failed").is_empty());

    let run = storage.get_run(run_id).expect("Missing run");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(
        run.counters,
        RunCounters {
            domains_processed: 5,
            pages_crawled: 3,
            persistence_failures: 0,
        }
    );
}
