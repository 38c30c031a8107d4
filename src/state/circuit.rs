use crate::config::CrawlConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Limits enforced on a single domain crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitLimits {
    pub time_budget: Duration,
    pub max_consecutive_failures: u32,
}

impl CircuitLimits {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            time_budget: config.domain_time_budget(),
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }
}

/// Why the page loop of a domain stopped before exhausting its candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TimeBudget,
    ConsecutiveFailures,
}

/// Tracks the per-domain circuit breaker during one crawl
///
/// Owned by a single crawl and never shared across domains. The clock starts
/// when the state is created, which is before resolution begins.
#[derive(Debug, Clone)]
pub struct CircuitState {
    started: Instant,

    /// Page fetch failures since the last success
    pub consecutive_failures: u32,
}

impl CircuitState {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            consecutive_failures: 0,
        }
    }

    /// Wall-clock time since the crawl started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before the budget is exhausted
    pub fn remaining(&self, budget: Duration) -> Duration {
        budget.saturating_sub(self.elapsed())
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    /// Returns the reason to stop issuing fetches, if any
    ///
    /// The time budget is checked first.
    pub fn check(&self, limits: &CircuitLimits) -> Option<StopReason> {
        if self.elapsed() >= limits.time_budget {
            return Some(StopReason::TimeBudget);
        }
        if self.consecutive_failures >= limits.max_consecutive_failures {
            return Some(StopReason::ConsecutiveFailures);
        }
        None
    }
}
