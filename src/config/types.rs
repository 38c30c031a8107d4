use serde::Deserialize;
use std::time::Duration;

/// Browser User-Agent pool used when the config does not override it
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Main configuration structure for Forge-Scout
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub crawl: CrawlConfig,
    pub resolver: ResolverConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub vocabulary: VocabularyConfig,
}

/// Batch scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of pending domains pulled per batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Global ceiling on concurrently crawled domains
    pub concurrency: usize,

    /// Pause between two batches (milliseconds)
    #[serde(rename = "batch-cooldown-ms")]
    pub batch_cooldown_ms: u64,

    /// Keep polling for new work after the backlog drains
    pub continuous: bool,

    /// Pause between polls in continuous mode (seconds)
    #[serde(rename = "check-interval-secs")]
    pub check_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            concurrency: 50,
            batch_cooldown_ms: 5_000,
            continuous: false,
            check_interval_secs: 24 * 60 * 60,
        }
    }
}

impl SchedulerConfig {
    pub fn batch_cooldown(&self) -> Duration {
        Duration::from_millis(self.batch_cooldown_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Per-domain crawl limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of internal pages sampled after the entry page
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: usize,

    /// Wall-clock budget for one domain, measured from crawl start (milliseconds)
    #[serde(rename = "domain-time-budget-ms")]
    pub domain_time_budget_ms: u64,

    /// Consecutive page failures that stop the page loop
    #[serde(rename = "max-consecutive-failures")]
    pub max_consecutive_failures: u32,

    /// Lower bound of the random delay before resolving a domain (milliseconds)
    #[serde(rename = "jitter-min-ms")]
    pub jitter_min_ms: u64,

    /// Upper bound of the random delay before resolving a domain (milliseconds)
    #[serde(rename = "jitter-max-ms")]
    pub jitter_max_ms: u64,

    /// Require a contact e-mail address for a `completed` outcome
    #[serde(rename = "track-emails")]
    pub track_emails: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages_per_domain: 15,
            domain_time_budget_ms: 60_000,
            max_consecutive_failures: 3,
            jitter_min_ms: 500,
            jitter_max_ms: 1_500,
            track_emails: false,
        }
    }
}

impl CrawlConfig {
    pub fn domain_time_budget(&self) -> Duration {
        Duration::from_millis(self.domain_time_budget_ms)
    }
}

/// URL variant resolution configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Full passes over the scheme/www variant list
    pub passes: u32,

    /// Delay between passes (milliseconds)
    #[serde(rename = "pass-delay-ms")]
    pub pass_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            passes: 2,
            pass_delay_ms: 2_000,
        }
    }
}

/// HTTP client and retry policy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Total timeout of a first attempt
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Total timeout of every retry attempt
    #[serde(rename = "retry-timeout-ms")]
    pub retry_timeout_ms: u64,

    #[serde(rename = "rate-limit-cooldown-ms")]
    pub rate_limit_cooldown_ms: u64,

    #[serde(rename = "rate-limit-retries")]
    pub rate_limit_retries: u32,

    #[serde(rename = "server-error-cooldown-ms")]
    pub server_error_cooldown_ms: u64,

    #[serde(rename = "server-error-retries")]
    pub server_error_retries: u32,

    #[serde(rename = "client-error-delay-ms")]
    pub client_error_delay_ms: u64,

    #[serde(rename = "client-error-retries")]
    pub client_error_retries: u32,

    #[serde(rename = "network-retry-delay-ms")]
    pub network_retry_delay_ms: u64,

    #[serde(rename = "network-retries")]
    pub network_retries: u32,

    /// Idle keep-alive connections kept per host
    #[serde(rename = "max-idle-per-host")]
    pub max_idle_per_host: usize,

    #[serde(rename = "idle-timeout-ms")]
    pub idle_timeout_ms: u64,

    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Pool of User-Agent strings; one is picked at random per request
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 15_000,
            retry_timeout_ms: 30_000,
            rate_limit_cooldown_ms: 5_000,
            rate_limit_retries: 2,
            server_error_cooldown_ms: 3_000,
            server_error_retries: 1,
            client_error_delay_ms: 1_000,
            client_error_retries: 1,
            network_retry_delay_ms: 1_000,
            network_retries: 1,
            max_idle_per_host: 20,
            idle_timeout_ms: 30_000,
            max_redirects: 10,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./forge-scout.db".to_string(),
        }
    }
}

/// Vocabulary source configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Optional vocabulary TOML file; the embedded vocabulary is used when unset
    pub path: Option<String>,
}
