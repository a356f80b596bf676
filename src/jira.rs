//! JIRA plugin: REST client plus the [`Tracker`] implementation.

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
pub const JIRA_API_BASE: &str = "https://issues.redhat.com";

/// One issue as returned by the tracker.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JiraIssueRecord {
    pub key: String,
    pub fields: JiraIssueFields,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JiraIssueFields {
    pub status: JiraStatusField,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JiraStatusField {
    pub name: String,
}

/// Capability for fetching an issue by key. Implemented over the REST
/// API in production and by stubs in tests.
#[async_trait]
pub trait JiraClient: Send + Sync {
    /// `Ok(None)` means the tracker answered and the issue does not
    /// exist; transport and parse failures are `Err`.
    async fn issue(&self, key: &str) -> anyhow::Result<Option<JiraIssueRecord>>;
}

/// Thin client for the JIRA REST API.
pub struct RestJiraClient {
    http: reqwest::Client,
    api_base: String,
    login: String,
    password: String,
}

impl RestJiraClient {
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
impl JiraClient for RestJiraClient {
    async fn issue(&self, key: &str) -> anyhow::Result<Option<JiraIssueRecord>> {
        let response = self
            .http
            .get(format!("{}/rest/api/2/issue/{key}", self.api_base))
            .query(&[("fields", "status")])
            .basic_auth(&self.login, Some(&self.password))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record: JiraIssueRecord = response.error_for_status()?.json().await?;
        Ok(Some(record))
    }
}

/// Tracker plugin for JIRA issue links.
pub struct JiraTracker {
    client: Arc<dyn JiraClient>,
}

impl JiraTracker {
    pub fn new(client: Arc<dyn JiraClient>) -> Self {
        Self { client }
    }

    /// Builds the plugin with a REST client configured from
    /// `jira.login` and `jira.password`.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let login = props.require("jira.login")?;
        let password = props.require("jira.password")?;
        Ok(Self::new(Arc::new(RestJiraClient::new(
            JIRA_API_BASE,
            login,
            password,
        ))))
    }
}

/// The issue key is the path segment after `browse`.
fn issue_key_from_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "browse")?;
    let key = segments.next()?;
    (!key.is_empty()).then(|| key.to_string())
}

#[async_trait]
impl Tracker for JiraTracker {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Jira
    }

    fn accepts(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(patterns::JIRA_HOST))
    }

    async fn find_issue(&self, url: &Url) -> Result<Issue, TrackerError> {
        let key = issue_key_from_url(url)
            .ok_or_else(|| TrackerError::issue_unavailable(url, "no issue key in URL"))?;

        match self.client.issue(&key).await {
            Ok(Some(record)) => Ok(Issue {
                id: record.key,
                url: url.clone(),
                raw_status: record.fields.status.name,
                tracker: TrackerKind::Jira,
            }),
            Ok(None) => Err(TrackerError::issue_unavailable(url, "issue does not exist")),
            Err(err) => Err(TrackerError::issue_unavailable(url, err.to_string())),
        }
    }

    async fn update_status(&self, _url: &Url, _status: IssueStatus) -> Result<bool, TrackerError> {
        Err(TrackerError::UnsupportedOperation {
            tracker: TrackerKind::Jira,
        })
    }

    fn extract_urls(&self, description: &str) -> Vec<Url> {
        extract_reference_urls(patterns::JIRA_BROWSE_BASE, &patterns::JIRA_ISSUE, description)
    }
}
