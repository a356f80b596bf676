use thiserror::Error;
use url::Url;

use crate::types::TrackerKind;

/// Errors surfaced by tracker plugins.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The tracker was reachable but the record is missing, or the
    /// round-trip failed in transport or parsing. Always caught and
    /// logged at the dispatch boundary; one bad reference never aborts
    /// resolution of the others.
    #[error("issue unavailable at {url}: {reason}")]
    IssueUnavailable { url: Url, reason: String },

    /// The tracker intentionally does not offer this capability.
    /// Surfaces to the caller, who must treat it as "feature not
    /// offered" rather than a failed attempt.
    #[error("{tracker} does not support status updates")]
    UnsupportedOperation { tracker: TrackerKind },
}

impl TrackerError {
    pub fn issue_unavailable(url: &Url, reason: impl Into<String>) -> Self {
        Self::IssueUnavailable {
            url: url.clone(),
            reason: reason.into(),
        }
    }
}

/// Configuration failures. Fatal at initialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required property: {0}")]
    MissingProperty(String),
}
