//! Prxref: cross-tracker reference resolution for pull requests.
//!
//! Correlates a GitHub pull request with the issue-tracker records
//! (Bugzilla, JIRA) and the other pull requests its description refers
//! to, for automated merge and build-status workflows. Tracker systems
//! plug in behind one capability trait, reference grammars live in a
//! compiled-once pattern registry, and the pull-request aggregate
//! resolves and caches the relationships lazily.

pub mod bugzilla;
pub mod config;
pub mod error;
pub mod github;
pub mod jira;
pub mod patterns;
pub mod pull_request;
pub mod tracker;
pub mod types;

pub use bugzilla::{BugRecord, BugzillaClient, BugzillaTracker, RestBugzillaClient};
pub use config::Properties;
pub use error::{ConfigError, TrackerError};
pub use github::{OctocrabGateway, RepoGateway};
pub use jira::{JiraClient, JiraIssueRecord, JiraTracker, RestJiraClient};
pub use pull_request::PullRequestAggregate;
pub use tracker::{Tracker, TrackerSet};
pub use types::{
    BuildResult, Comment, CommitState, Issue, IssueStatus, Milestone, PullRequestSnapshot,
    PullRequestState, Repo, RepoError, TrackerKind,
};
