//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlStatus`: The terminal (or pending) status persisted per domain
//! - `CircuitState`: Per-domain time budget and consecutive-failure breaker

mod circuit;
mod status;

// Re-export main types
pub use circuit::{CircuitLimits, CircuitState, StopReason};
pub use status::CrawlStatus;
