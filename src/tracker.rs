//! The tracker plugin contract and the ordered dispatch collection.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::{
    error::TrackerError,
    types::{Issue, IssueStatus, TrackerKind},
};

/// Capability contract every issue-tracker plugin implements.
///
/// A plugin wraps exactly one underlying tracker client, initialized
/// once from configuration and held for the plugin's lifetime.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn kind(&self) -> TrackerKind;

    /// Pure host check deciding whether this plugin understands `url`.
    /// No network round-trip.
    fn accepts(&self, url: &Url) -> bool;

    /// Resolves the issue behind an accepted URL.
    ///
    /// Callers must have confirmed `accepts` first; id extraction
    /// assumes the URL shape of this plugin's tracker. A missing record
    /// and a transport or parse failure both surface as
    /// [`TrackerError::IssueUnavailable`].
    async fn find_issue(&self, url: &Url) -> Result<Issue, TrackerError>;

    /// Moves the issue behind an accepted URL to `status`.
    ///
    /// Plugins without real update capability fail with
    /// [`TrackerError::UnsupportedOperation`].
    async fn update_status(&self, url: &Url, status: IssueStatus) -> Result<bool, TrackerError>;

    /// All issue URLs of this tracker referenced in `description`, in
    /// match order. Extraction is best-effort: a match that cannot be
    /// reconstructed into a URL is logged and dropped.
    fn extract_urls(&self, description: &str) -> Vec<Url>;

    /// Whether `description` references at least one issue of this
    /// tracker. Derived from `extract_urls` so detection and extraction
    /// cannot disagree.
    fn has_link_in_description(&self, description: &str) -> bool {
        !self.extract_urls(description).is_empty()
    }
}

/// Rebuilds canonical issue URLs from every pattern match in `text`,
/// appending the captured id to `base`.
pub(crate) fn extract_reference_urls(base: &str, pattern: &Regex, text: &str) -> Vec<Url> {
    let mut urls = Vec::new();
    for caps in pattern.captures_iter(text) {
        let id = &caps[1];
        match Url::parse(&format!("{base}{id}")) {
            Ok(url) => urls.push(url),
            Err(err) => debug!(id, %err, "dropping malformed issue reference"),
        }
    }
    urls
}

/// Ordered collection of tracker plugins.
///
/// Order is significant: an ambiguous URL resolves to the first
/// accepting plugin.
pub struct TrackerSet {
    trackers: Vec<Box<dyn Tracker>>,
}

impl TrackerSet {
    pub fn new(trackers: Vec<Box<dyn Tracker>>) -> Self {
        Self { trackers }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tracker> {
        self.trackers.iter().map(Box::as_ref)
    }

    /// First plugin whose `accepts` matches `url`, if any.
    pub fn accepting(&self, url: &Url) -> Option<&dyn Tracker> {
        self.iter().find(|tracker| tracker.accepts(url))
    }
}
