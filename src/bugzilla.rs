//! Bugzilla plugin: REST client plus the [`Tracker`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::{
    config::Properties,
    error::{ConfigError, TrackerError},
    patterns,
    tracker::{Tracker, extract_reference_urls},
    types::{Issue, IssueStatus, TrackerKind},
};

/// Instance the REST client talks to.
pub const BUGZILLA_API_BASE: &str = "https://bugzilla.redhat.com";

/// One bug as returned by the tracker.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BugRecord {
    pub id: u64,
    pub status: String,
}

/// Capability for fetching a bug by id. Implemented over the REST API
/// in production and by stubs in tests.
#[async_trait]
pub trait BugzillaClient: Send + Sync {
    /// `Ok(None)` means the tracker answered and the bug does not
    /// exist; transport and parse failures are `Err`.
    async fn bug(&self, id: u64) -> anyhow::Result<Option<BugRecord>>;
}

#[derive(Debug, Deserialize)]
struct BugsResponse {
    bugs: Vec<BugRecord>,
}

/// Thin client for the Bugzilla REST API.
pub struct RestBugzillaClient {
    http: reqwest::Client,
    api_base: String,
    login: String,
    password: String,
}

impl RestBugzillaClient {
    pub fn new(
        api_base: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            login: login.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl BugzillaClient for RestBugzillaClient {
    async fn bug(&self, id: u64) -> anyhow::Result<Option<BugRecord>> {
        let response = self
            .http
            .get(format!("{}/rest/bug/{id}", self.api_base))
            .query(&[("login", self.login.as_str()), ("password", self.password.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let parsed: BugsResponse = response.error_for_status()?.json().await?;
        Ok(parsed.bugs.into_iter().next())
    }
}

/// Tracker plugin for Bugzilla issue links.
pub struct BugzillaTracker {
    client: Arc<dyn BugzillaClient>,
}

impl BugzillaTracker {
    pub fn new(client: Arc<dyn BugzillaClient>) -> Self {
        Self { client }
    }

    /// Builds the plugin with a REST client configured from
    /// `bugzilla.login` and `bugzilla.password`.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let login = props.require("bugzilla.login")?;
        let password = props.require("bugzilla.password")?;
        Ok(Self::new(Arc::new(RestBugzillaClient::new(
            BUGZILLA_API_BASE,
            login,
            password,
        ))))
    }
}

fn bug_id_from_url(url: &Url) -> Option<u64> {
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .and_then(|(_, value)| value.parse().ok())
}

#[async_trait]
impl Tracker for BugzillaTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Bugzilla
    }

    fn accepts(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(patterns::BUGZILLA_HOST))
    }

    async fn find_issue(&self, url: &Url) -> Result<Issue, TrackerError> {
        let id = bug_id_from_url(url)
            .ok_or_else(|| TrackerError::issue_unavailable(url, "no bug id in URL"))?;

        match self.client.bug(id).await {
            Ok(Some(bug)) => Ok(Issue {
                id: bug.id.to_string(),
                url: url.clone(),
                raw_status: bug.status,
                tracker: TrackerKind::Bugzilla,
            }),
            Ok(None) => Err(TrackerError::issue_unavailable(url, "bug does not exist")),
            Err(err) => Err(TrackerError::issue_unavailable(url, err.to_string())),
        }
    }

    async fn update_status(&self, _url: &Url, _status: IssueStatus) -> Result<bool, TrackerError> {
        Err(TrackerError::UnsupportedOperation {
            tracker: TrackerKind::Bugzilla,
        })
    }

    fn extract_urls(&self, description: &str) -> Vec<Url> {
        extract_reference_urls(
            patterns::BUGZILLA_ISSUE_BASE,
            &patterns::BUGZILLA_ISSUE,
            description,
        )
    }
}
