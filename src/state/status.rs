/// Domain status definitions
///
/// This module defines every status a backlog row can carry.
use serde::Serialize;
use std::fmt;

/// Represents the status of a domain in the backlog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    // ===== Active States =====
    /// Domain is waiting to be crawled
    Pending,

    // ===== Terminal Success States =====
    /// At least one signal was detected (and an e-mail, when tracked)
    Completed,

    /// Pages were crawled but nothing in the vocabularies matched
    NoSignal,

    /// Signals were detected but no contact e-mail was found
    NoEmail,

    // ===== Terminal Error States =====
    /// No URL variant answered in any resolution pass
    Unreachable,

    /// The domain string failed the syntactic pre-check
    Invalid,

    /// Every resolution attempt was refused with HTTP 401/403
    Blocked,

    /// The crawl worker faulted
    Error,
}

impl CrawlStatus {
    /// Returns true if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if pages were crawled and classified
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::NoSignal | Self::NoEmail)
    }

    /// Returns true if this represents a failure to crawl at all
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Unreachable | Self::Invalid | Self::Blocked | Self::Error
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::NoSignal => "no_signal",
            Self::NoEmail => "no_email",
            Self::Unreachable => "unreachable",
            Self::Invalid => "invalid",
            Self::Blocked => "blocked",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "no_signal" => Some(Self::NoSignal),
            "no_email" => Some(Self::NoEmail),
            "unreachable" => Some(Self::Unreachable),
            "invalid" => Some(Self::Invalid),
            "blocked" => Some(Self::Blocked),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Completed,
            Self::NoSignal,
            Self::NoEmail,
            Self::Unreachable,
            Self::Invalid,
            Self::Blocked,
            Self::Error,
        ]
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
