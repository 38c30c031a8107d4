//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (pool limits, redirects, browser headers)
//! - User-Agent rotation per request
//! - Bounded retry on transient failure classes
//! - Running detection over every successfully fetched page
//!
//! Two seams keep the network out of the crawl logic: [`Transport`] performs
//! one raw GET, and [`PageFetcher`] turns a URL into a [`PageRecord`] or a
//! typed [`FetchFailure`].

use crate::config::{FetchConfig, DEFAULT_USER_AGENTS};
use crate::crawler::types::PageRecord;
use crate::detect::{page_text, Detector};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// A response as seen by the retry layer
///
/// The body is only read for statuses below 400.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

/// Transport-level errors, classified for the retry policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Performs a single GET request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every concurrent crawl in a batch, so the idle
/// pool is bounded per host. The client-wide timeout is the retry timeout;
/// each request narrows it.
///
/// # Example
///
/// ```
/// use forge_scout::config::FetchConfig;
/// use forge_scout::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default());
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    match HeaderValue::from_str(&config.accept_language) {
        Ok(value) => {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        Err(_) => warn!(
            accept_language = %config.accept_language,
            "Ignoring Accept-Language value that is not a valid header"
        ),
    }

    Client::builder()
        .default_headers(headers)
        .timeout(config.retry_timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::limited(config.max_redirects))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(config.idle_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agents: Vec<String>,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            config.user_agents.clone(),
        ))
    }

    pub fn with_client(client: Client, user_agents: Vec<String>) -> Self {
        Self {
            client,
            user_agents,
        }
    }

    fn pick_user_agent(&self) -> String {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, TransportError> {
        let user_agent = self.pick_user_agent();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = if status < 400 {
            response.text().await?
        } else {
            String::new()
        };

        Ok(RawResponse {
            status,
            final_url,
            body,
        })
    }
}

/// Why a page could not be fetched, after retries were exhausted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP {status} after {attempts} attempt(s)")]
    Http { status: u16, attempts: u32 },

    #[error("{error} after {attempts} attempt(s)")]
    Network {
        error: TransportError,
        attempts: u32,
    },
}

impl FetchFailure {
    /// True if the server explicitly refused access (401/403)
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Http { attempts, .. } | Self::Network { attempts, .. } => *attempts,
        }
    }
}

/// Retry classes of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429
    RateLimited,
    /// HTTP 502, 503, 504
    ServerBusy,
    /// Any other status >= 400
    HttpStatus,
    /// Connect or read timeout, connection refused
    Network,
    /// Anything else (redirect loops, protocol errors); never retried
    Fatal,
}

impl FailureClass {
    pub fn of_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            502..=504 => Self::ServerBusy,
            _ => Self::HttpStatus,
        }
    }

    pub fn of_transport(error: &TransportError) -> Self {
        match error {
            TransportError::Timeout(_) | TransportError::Connect(_) => Self::Network,
            TransportError::Other(_) => Self::Fatal,
        }
    }
}

/// Bounded retry policy, one delay and retry ceiling per failure class
///
/// | Condition | Delay | Retries |
/// |-----------|-------|---------|
/// | HTTP 429 | rate-limit cooldown | `rate_limit_retries` |
/// | HTTP 502/503/504 | server-error cooldown | `server_error_retries` |
/// | Other 4xx/5xx | client-error delay | `client_error_retries` |
/// | Timeout, connection refused | network delay | `network_retries` |
/// | Other transport errors | - | 0 |
///
/// The first attempt uses the request timeout; retries use the longer retry
/// timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub rate_limit_cooldown: Duration,
    pub rate_limit_retries: u32,
    pub server_error_cooldown: Duration,
    pub server_error_retries: u32,
    pub client_error_delay: Duration,
    pub client_error_retries: u32,
    pub network_retry_delay: Duration,
    pub network_retries: u32,
    pub request_timeout: Duration,
    pub retry_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            rate_limit_cooldown: Duration::from_millis(config.rate_limit_cooldown_ms),
            rate_limit_retries: config.rate_limit_retries,
            server_error_cooldown: Duration::from_millis(config.server_error_cooldown_ms),
            server_error_retries: config.server_error_retries,
            client_error_delay: Duration::from_millis(config.client_error_delay_ms),
            client_error_retries: config.client_error_retries,
            network_retry_delay: Duration::from_millis(config.network_retry_delay_ms),
            network_retries: config.network_retries,
            request_timeout: config.request_timeout(),
            retry_timeout: config.retry_timeout(),
        }
    }

    /// Delay before the next attempt, or None once `retries_done` reaches
    /// the ceiling for the class
    pub fn backoff(&self, class: FailureClass, retries_done: u32) -> Option<Duration> {
        let (delay, ceiling) = match class {
            FailureClass::RateLimited => (self.rate_limit_cooldown, self.rate_limit_retries),
            FailureClass::ServerBusy => (self.server_error_cooldown, self.server_error_retries),
            FailureClass::HttpStatus => (self.client_error_delay, self.client_error_retries),
            FailureClass::Network => (self.network_retry_delay, self.network_retries),
            FailureClass::Fatal => return None,
        };
        (retries_done < ceiling).then_some(delay)
    }

    /// Timeout for the given 1-based attempt number
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            self.request_timeout
        } else {
            self.retry_timeout
        }
    }
}

/// Fetches one page and runs detection on it
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageRecord, FetchFailure>;
}

/// [`PageFetcher`] that retries through a [`Transport`] per [`RetryPolicy`]
pub struct RetryingFetcher<T> {
    transport: T,
    policy: RetryPolicy,
    detector: Arc<Detector>,
    track_emails: bool,
}

impl<T: Transport> RetryingFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy, detector: Arc<Detector>, track_emails: bool) -> Self {
        Self {
            transport,
            policy,
            detector,
            track_emails,
        }
    }

    /// Runs detection over a buffered body
    fn build_record(&self, url: &str, response: RawResponse) -> PageRecord {
        let text = page_text(&response.body);
        let detections = self.detector.detect(&text, url);
        let emails = if self.track_emails {
            self.detector.emails(&response.body)
        } else {
            BTreeSet::new()
        };

        PageRecord {
            url: url.to_string(),
            final_url: response.final_url,
            html: response.body,
            detections,
            emails,
        }
    }
}

#[async_trait]
impl<T: Transport> PageFetcher for RetryingFetcher<T> {
    async fn fetch(&self, url: &str) -> Result<PageRecord, FetchFailure> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let timeout = self.policy.timeout_for(attempt);

            let (class, failure) = match self.transport.get(url, timeout).await {
                Ok(response) if response.status < 400 => {
                    debug!(url = %url, status = response.status, attempt, "Fetched page");
                    return Ok(self.build_record(url, response));
                }
                Ok(response) => (
                    FailureClass::of_status(response.status),
                    FetchFailure::Http {
                        status: response.status,
                        attempts: attempt,
                    },
                ),
                Err(error) => (
                    FailureClass::of_transport(&error),
                    FetchFailure::Network {
                        error,
                        attempts: attempt,
                    },
                ),
            };

            match self.policy.backoff(class, attempt - 1) {
                Some(delay) => {
                    debug!(url = %url, attempt, ?class, ?delay, "Retrying after {}", failure);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    debug!(url = %url, "Giving up: {}", failure);
                    return Err(failure);
                }
            }
        }
    }
}
