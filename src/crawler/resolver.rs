//! Domain resolution
//!
//! Finds the first URL variant (scheme x `www.`) that answers for a bare
//! domain, tolerating slow servers with a second pass.

use crate::config::ResolverConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::types::ResolvedEntry;
use crate::url::url_variants;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why no variant of a domain could be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    #[error("no URL variant answered")]
    Unreachable,

    #[error("every URL variant refused access")]
    Blocked,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    passes: u32,
    pass_delay: Duration,
}

impl Resolver {
    pub fn new(passes: u32, pass_delay: Duration) -> Self {
        Self {
            passes: passes.max(1),
            pass_delay,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.passes, Duration::from_millis(config.pass_delay_ms))
    }

    /// Tries every variant in order, for up to `passes` passes
    ///
    /// The result is `Blocked` only when every attempt failed with HTTP
    /// 401/403.
    pub async fn resolve(
        &self,
        domain: &str,
        fetcher: &dyn PageFetcher,
    ) -> Result<ResolvedEntry, ResolveFailure> {
        let mut all_blocking = true;

        for pass in 1..=self.passes {
            if pass > 1 {
                tokio::time::sleep(self.pass_delay).await;
            }

            for url in url_variants(domain) {
                match fetcher.fetch(&url).await {
                    Ok(page) => {
                        debug!(domain = %domain, url = %url, pass, "Resolved entry page");
                        return Ok(ResolvedEntry {
                            domain: domain.to_string(),
                            url,
                            page,
                        });
                    }
                    Err(failure) => {
                        all_blocking &= failure.is_blocking();
                        debug!(domain = %domain, url = %url, pass, "Variant failed: {}", failure);
                    }
                }
            }
        }

        if all_blocking {
            Err(ResolveFailure::Blocked)
        } else {
            Err(ResolveFailure::Unreachable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::testing::{MockFetcher, MockPage};

    fn resolver() -> Resolver {
        Resolver::new(2, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_first_variant_wins() {
        let fetcher = MockFetcher::new().page("https://acme.com", "<p>home</p>");
        let entry = resolver().resolve("acme.com", &fetcher).await.unwrap();

        assert_eq!(entry.url, "https://acme.com");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_www() {
        let fetcher = MockFetcher::new().page("https://www.acme.com", "<p>home</p>");
        let entry = resolver().resolve("acme.com", &fetcher).await.unwrap();

        assert_eq!(entry.url, "https://www.acme.com");
        assert_eq!(
            fetcher.requested(),
            vec!["https://acme.com", "https://www.acme.com"]
        );
    }

    #[tokio::test]
    async fn test_http_only_site() {
        let fetcher = MockFetcher::new().page("http://www.acme.com", "<p>home</p>");
        let entry = resolver().resolve("acme.com", &fetcher).await.unwrap();
        assert_eq!(entry.url, "http://www.acme.com");
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_after_two_passes() {
        let fetcher = MockFetcher::new();
        let result = resolver().resolve("doesnotexist-xyz123.invalid", &fetcher).await;

        assert_eq!(result.unwrap_err(), ResolveFailure::Unreachable);
        assert_eq!(fetcher.calls(), 8);
    }

    #[tokio::test]
    async fn test_single_pass() {
        let fetcher = MockFetcher::new();
        let result = Resolver::new(1, Duration::ZERO).resolve("acme.com", &fetcher).await;
        assert!(result.is_err());
        assert_eq!(fetcher.calls(), 4);
    }

    #[tokio::test]
    async fn test_blocked_when_every_variant_refuses() {
        let mut fetcher = MockFetcher::new();
        for url in url_variants("acme.com") {
            fetcher = fetcher.with(&url, MockPage::Status(403));
        }
        let result = resolver().resolve("acme.com", &fetcher).await;
        assert_eq!(result.unwrap_err(), ResolveFailure::Blocked);
    }

    #[tokio::test]
    async fn test_mixed_refusal_and_network_failure_is_unreachable() {
        let fetcher = MockFetcher::new()
            .with("https://acme.com", MockPage::Status(403))
            .with("https://www.acme.com", MockPage::Status(401));
        let result = resolver().resolve("acme.com", &fetcher).await;
        assert_eq!(result.unwrap_err(), ResolveFailure::Unreachable);
    }

    #[test]
    fn test_zero_passes_clamped() {
        let resolver = Resolver::new(0, Duration::ZERO);
        assert_eq!(resolver.passes, 1);
    }
}
