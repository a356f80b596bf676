use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Issue-tracking systems the engine knows how to dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    Bugzilla,
    Jira,
}

impl std::fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerKind::Bugzilla => write!(f, "Bugzilla"),
            TrackerKind::Jira => write!(f, "JIRA"),
        }
    }
}

/// Normalized, tracker-agnostic view of one external issue.
///
/// Immutable once constructed from a tracker response; only plugins
/// build these. `raw_status` carries the tracker's own status string
/// untranslated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: String,
    pub url: Url,
    pub raw_status: String,
    pub tracker: TrackerKind,
}

/// Closed set of issue status values shared across trackers.
///
/// Status updates take one of these instead of a free-form string, so a
/// typo cannot reach a tracker as a bogus transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatus {
    New,
    Assigned,
    Modified,
    OnQa,
    Verified,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::New => "NEW",
            IssueStatus::Assigned => "ASSIGNED",
            IssueStatus::Modified => "MODIFIED",
            IssueStatus::OnQa => "ON_QA",
            IssueStatus::Verified => "VERIFIED",
            IssueStatus::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized issue status: '{0}'")]
pub struct IssueStatusError(String);

impl std::str::FromStr for IssueStatus {
    type Err = IssueStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(IssueStatus::New),
            "ASSIGNED" => Ok(IssueStatus::Assigned),
            "MODIFIED" => Ok(IssueStatus::Modified),
            "ON_QA" => Ok(IssueStatus::OnQa),
            "VERIFIED" => Ok(IssueStatus::Verified),
            "CLOSED" => Ok(IssueStatus::Closed),
            other => Err(IssueStatusError(other.to_string())),
        }
    }
}

/// Outcome a CI system recorded in a pull-request comment.
///
/// `Unknown` doubles as the sentinel when no comment carries the
/// build-outcome marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildResult {
    Success,
    Failure,
    Unstable,
    Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized build outcome: '{0}'")]
pub struct BuildResultError(String);

impl std::str::FromStr for BuildResult {
    type Err = BuildResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "FAILURE" => Ok(BuildResult::Failure),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            other => Err(BuildResultError(other.to_string())),
        }
    }
}

/// State to report when posting a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitState {
    Pending,
    Success,
    Error,
    Failure,
}

impl CommitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
            CommitState::Error => "error",
            CommitState::Failure => "failure",
        }
    }
}

/// Pull request states as reported by the forge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Closed,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
        }
    }
}

/// A validated organization/repository pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    org: String,
    name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoError {
    #[error("organization must not be empty")]
    EmptyOrg,
    #[error("repository name must not be empty")]
    EmptyName,
    #[error("'{0}' must not contain '/' or whitespace")]
    InvalidSegment(String),
}

impl Repo {
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoError> {
        let org = org.into();
        let name = name.into();
        if org.is_empty() {
            return Err(RepoError::EmptyOrg);
        }
        if name.is_empty() {
            return Err(RepoError::EmptyName);
        }
        for segment in [&org, &name] {
            if segment.contains('/') || segment.contains(char::is_whitespace) {
                return Err(RepoError::InvalidSegment(segment.clone()));
            }
        }
        Ok(Self { org, name })
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

/// Milestone attached to a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub title: String,
}

/// One issue comment on a pull request, in thread order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of one remote pull request.
///
/// `url` is the canonical API URL; the org/repo pair an aggregate
/// belongs to is derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSnapshot {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: PullRequestState,
    pub url: String,
    pub html_url: String,
    pub head_sha: String,
    pub base_ref: String,
    pub user: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub milestone: Option<Milestone>,
}

impl PullRequestSnapshot {
    /// Org/repo pair this pull request lives in, recovered by matching
    /// the full-URL reference grammar against the canonical API URL.
    pub fn repo(&self) -> Option<Repo> {
        let caps = crate::patterns::RELATED_PR.captures(&self.url)?;
        Repo::new(&caps[1], &caps[2]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_rejects_empty_and_malformed_segments() {
        assert_eq!(Repo::new("", "repo").unwrap_err(), RepoError::EmptyOrg);
        assert_eq!(Repo::new("org", "").unwrap_err(), RepoError::EmptyName);
        assert!(matches!(
            Repo::new("org/extra", "repo").unwrap_err(),
            RepoError::InvalidSegment(_)
        ));
        assert!(matches!(
            Repo::new("org", "re po").unwrap_err(),
            RepoError::InvalidSegment(_)
        ));
    }

    #[test]
    fn repo_displays_as_org_slash_name() {
        let repo = Repo::new("uselessorg", "jboss-eap").unwrap();
        assert_eq!(repo.to_string(), "uselessorg/jboss-eap");
    }

    #[test]
    fn build_result_parses_marker_keywords_case_insensitively() {
        assert_eq!(
            "SUCCESS".parse::<BuildResult>().unwrap(),
            BuildResult::Success
        );
        assert_eq!(
            "failure".parse::<BuildResult>().unwrap(),
            BuildResult::Failure
        );
        assert_eq!(
            "Unstable".parse::<BuildResult>().unwrap(),
            BuildResult::Unstable
        );
        assert!("ABORTED".parse::<BuildResult>().is_err());
    }

    #[test]
    fn snapshot_repo_is_derived_from_the_canonical_url() {
        let snapshot = PullRequestSnapshot {
            number: 2,
            title: String::new(),
            body: String::new(),
            state: PullRequestState::Open,
            url: "https://api.github.com/repos/uselessorg/jboss-eap/pulls/2".to_string(),
            html_url: "https://github.com/uselessorg/jboss-eap/pull/2".to_string(),
            head_sha: "abc123".to_string(),
            base_ref: "main".to_string(),
            user: "alice".to_string(),
            updated_at: None,
            milestone: None,
        };
        assert_eq!(
            snapshot.repo(),
            Some(Repo::new("uselessorg", "jboss-eap").unwrap())
        );

        let mut unparsable = snapshot;
        unparsable.url = "not a url".to_string();
        assert_eq!(unparsable.repo(), None);
    }

    #[test]
    fn issue_status_round_trips_through_strings() {
        for status in [
            IssueStatus::New,
            IssueStatus::Assigned,
            IssueStatus::Modified,
            IssueStatus::OnQa,
            IssueStatus::Verified,
            IssueStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<IssueStatus>().unwrap(), status);
        }
        assert!("WONTFIX".parse::<IssueStatus>().is_err());
    }
}
