//! Forge-Scout: manufacturing capability detection for domain backlogs
//!
//! This crate pulls pending domains from a result store, fetches each
//! domain's homepage plus a bounded set of internal pages, and classifies the
//! aggregate text against fixed vocabularies (capability terms, equipment
//! brands, plastics, metals). One outcome is persisted per domain.

pub mod config;
pub mod crawler;
pub mod detect;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Forge-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] detect::VocabularyError),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Every outcome write in a batch of {domains} domains failed; stopping")]
    PersistenceStalled { domains: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Reasons a raw backlog domain is rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Domain is empty")]
    Empty,

    #[error("Domain '{0}' is a placeholder value")]
    Placeholder(String),

    #[error("Domain '{0}' looks like a search-result artifact")]
    SearchArtifact(String),

    #[error("Domain '{0}' has no dot")]
    MissingDot(String),

    #[error("Domain '{0}' contains invalid characters")]
    InvalidCharacters(String),
}

/// Result type alias for Forge-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOutcome, DomainTask, PageRecord, ResolvedEntry};
pub use detect::{DetectionSet, Detector, Vocabulary};
pub use state::{CircuitState, CrawlStatus};
pub use url::{normalize_domain, prepare_domain, validate_domain};
