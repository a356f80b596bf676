//! The pull-request aggregate: one remote PR snapshot plus its lazily
//! resolved relationships to tracker issues and other pull requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::{
    error::TrackerError,
    github::RepoGateway,
    patterns,
    tracker::TrackerSet,
    types::{
        BuildResult, Comment, CommitState, Issue, IssueStatus, Milestone, PullRequestSnapshot,
        PullRequestState, Repo,
    },
};

/// One pull request and its derived relationships.
///
/// The snapshot is immutable for the aggregate's lifetime. Related pull
/// requests are resolved once and cached; the issue list is recomputed
/// on every call. Two aggregates wrapping the same remote PR are
/// independent cached views and are never merged.
pub struct PullRequestAggregate {
    snapshot: PullRequestSnapshot,
    trackers: Arc<TrackerSet>,
    gateway: Arc<dyn RepoGateway>,
    related: OnceCell<Vec<PullRequestAggregate>>,
}

impl PullRequestAggregate {
    /// Wraps a snapshot. The tracker set and gateway are shared with
    /// every aggregate spawned from this one, not owned.
    pub fn new(
        snapshot: PullRequestSnapshot,
        trackers: Arc<TrackerSet>,
        gateway: Arc<dyn RepoGateway>,
    ) -> Self {
        Self {
            snapshot,
            trackers,
            gateway,
            related: OnceCell::new(),
        }
    }

    fn adopt(&self, snapshot: PullRequestSnapshot) -> Self {
        Self::new(
            snapshot,
            Arc::clone(&self.trackers),
            Arc::clone(&self.gateway),
        )
    }

    /// Issues referenced in the description, in plugin-list order then
    /// match order. Unresolvable references are logged and skipped, so
    /// one dead link never hides the live ones. Duplicates across
    /// trackers are kept as-is.
    ///
    /// Unlike `related_pull_requests`, the result is recomputed on
    /// every call.
    pub async fn issues(&self) -> Vec<Issue> {
        let description = self.description();
        let mut issues = Vec::new();
        for tracker in self.trackers.iter() {
            if tracker.has_link_in_description(description) {
                for url in tracker.extract_urls(description) {
                    match tracker.find_issue(&url).await {
                        Ok(issue) => issues.push(issue),
                        Err(err) => warn!(%url, %err, "failed to locate issue"),
                    }
                }
            }
        }
        issues
    }

    /// Whether any configured tracker recognizes a link in the
    /// description.
    pub fn has_issue_link_in_description(&self) -> bool {
        self.trackers
            .iter()
            .any(|tracker| tracker.has_link_in_description(self.description()))
    }

    /// Whether the description references another pull request in any
    /// of the recognized forms. Detection only; resolution happens in
    /// `related_pull_requests`.
    pub fn has_related_pull_request_in_description(&self) -> bool {
        let description = self.description();
        patterns::RELATED_PR.is_match(description)
            || patterns::ABBREVIATED_RELATED_PR.is_match(description)
            || patterns::COMMIT_RELATED_PR.is_match(description)
    }

    /// Pull requests referenced from the description, resolved through
    /// the gateway and wrapped as aggregates sharing this one's tracker
    /// set and gateway.
    ///
    /// Resolved once per aggregate; later calls return the cached
    /// result even if the remote side has changed. References the
    /// gateway cannot resolve are dropped without error, and a PR
    /// matched by both the full-URL and the abbreviated grammar shows
    /// up twice.
    pub async fn related_pull_requests(&self) -> &[PullRequestAggregate] {
        self.related
            .get_or_init(|| self.resolve_related())
            .await
            .as_slice()
    }

    async fn resolve_related(&self) -> Vec<PullRequestAggregate> {
        let description = self.description();
        let mut related = Vec::new();

        for caps in patterns::RELATED_PR.captures_iter(description) {
            if let Some(child) = self.fetch_related(&caps[1], &caps[2], &caps[3]).await {
                related.push(child);
            }
        }

        for caps in patterns::ABBREVIATED_RELATED_PR.captures_iter(description) {
            let matched = caps.get(0).map_or("", |m| m.as_str());

            // An org/repo qualifier makes the reference external; a
            // qualified reference the gateway cannot resolve falls back
            // to a same-repository lookup of the bare number.
            if let Some(external) = patterns::ABBREVIATED_EXTERNAL_REPO.captures(matched) {
                if let Some(child) = self
                    .fetch_related(&external[1], &external[2], &external[3])
                    .await
                {
                    related.push(child);
                    continue;
                }
            }

            let Some(own) = self.repo() else {
                warn!(url = %self.snapshot.url, "cannot derive own repository, skipping abbreviated reference");
                continue;
            };
            if let Some(child) = self.fetch_related(own.org(), own.name(), &caps[2]).await {
                related.push(child);
            }
        }

        related
    }

    async fn fetch_related(&self, org: &str, name: &str, number: &str) -> Option<Self> {
        let number: u64 = number.parse().ok()?;
        let repo = Repo::new(org, name).ok()?;
        let snapshot = self.gateway.pull_request(&repo, number).await?;
        Some(self.adopt(snapshot))
    }

    /// Upstream contributions are required unless the description
    /// explicitly opts out.
    pub fn is_upstream_required(&self) -> bool {
        !patterns::UPSTREAM_NOT_REQUIRED.is_match(self.description())
    }

    /// True when no milestone is set or the milestone is a wildcard
    /// placeholder (a title like `6.x`) rather than a concrete release.
    pub fn is_milestone_missing_or_wildcard(&self) -> bool {
        self.snapshot
            .milestone
            .as_ref()
            .is_none_or(|milestone| milestone.title.contains('x'))
    }

    /// Outcome of the latest CI run recorded in the comments. The last
    /// marker wins, across comments and within one comment; with no
    /// marker anywhere this is [`BuildResult::Unknown`].
    pub async fn build_result(&self) -> BuildResult {
        let mut result = BuildResult::Unknown;
        for comment in self.gateway.comments(&self.snapshot).await {
            for caps in patterns::BUILD_OUTCOME.captures_iter(&comment.body) {
                if let Ok(outcome) = caps[1].parse() {
                    result = outcome;
                }
            }
        }
        result
    }

    /// Most recent comment whose body matches `pattern`, if any.
    pub async fn last_matching_comment(&self, pattern: &Regex) -> Option<Comment> {
        self.gateway
            .comments(&self.snapshot)
            .await
            .into_iter()
            .filter(|comment| pattern.is_match(&comment.body))
            .next_back()
    }

    /// Routes a status update to the first plugin accepting the issue's
    /// URL. `Ok(false)` when no configured plugin accepts it; the
    /// issue's tracker simply isn't configured here.
    pub async fn update_issue_status(
        &self,
        issue: &Issue,
        status: IssueStatus,
    ) -> Result<bool, TrackerError> {
        match self.trackers.accepting(&issue.url) {
            Some(tracker) => tracker.update_status(&issue.url, status).await,
            None => Ok(false),
        }
    }

    /// Org/repo pair derived from the snapshot's canonical URL.
    pub fn repo(&self) -> Option<Repo> {
        self.snapshot.repo()
    }

    pub fn number(&self) -> u64 {
        self.snapshot.number
    }

    pub fn title(&self) -> &str {
        &self.snapshot.title
    }

    pub fn description(&self) -> &str {
        &self.snapshot.body
    }

    pub fn state(&self) -> PullRequestState {
        self.snapshot.state
    }

    pub fn url(&self) -> &str {
        &self.snapshot.url
    }

    pub fn html_url(&self) -> &str {
        &self.snapshot.html_url
    }

    pub fn head_sha(&self) -> &str {
        &self.snapshot.head_sha
    }

    pub fn base_ref(&self) -> &str {
        &self.snapshot.base_ref
    }

    pub fn user(&self) -> &str {
        &self.snapshot.user
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.updated_at
    }

    pub fn milestone(&self) -> Option<&Milestone> {
        self.snapshot.milestone.as_ref()
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.gateway.comments(&self.snapshot).await
    }

    pub async fn post_comment(&self, body: &str) -> anyhow::Result<()> {
        self.gateway.post_comment(&self.snapshot, body).await
    }

    pub async fn post_status(&self, target_url: &str, state: CommitState) -> anyhow::Result<()> {
        self.gateway
            .post_status(&self.snapshot, target_url, state)
            .await
    }

    pub async fn labels(&self) -> Vec<String> {
        self.gateway.labels(&self.snapshot).await
    }

    pub async fn add_label(&self, label: &str) -> anyhow::Result<()> {
        self.gateway.add_label(&self.snapshot, label).await
    }

    pub async fn remove_label(&self, label: &str) -> anyhow::Result<()> {
        self.gateway.remove_label(&self.snapshot, label).await
    }

    pub async fn is_merged(&self) -> bool {
        self.gateway.is_merged(&self.snapshot).await
    }
}
