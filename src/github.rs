//! The repository gateway: the forge-side capability the engine
//! consumes for fetching pull requests and acting on them.
//!
//! The trait keeps tests free of the network; [`OctocrabGateway`] is
//! the production implementation.

use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::IssueState;
use tracing::warn;

use crate::{
    config::Properties,
    types::{
        Comment, CommitState, Milestone, PullRequestSnapshot, PullRequestState, Repo,
    },
};

/// Capability for reading and mutating pull requests on the forge.
///
/// Read operations degrade gracefully: a failed fetch is logged and
/// surfaces as an absent or empty value, never as an error. Write
/// operations report their failure to the caller.
#[async_trait]
pub trait RepoGateway: Send + Sync {
    /// Fetches one pull request. `None` both when the PR does not exist
    /// and when the fetch fails; a missing remote PR is "not a real
    /// relation", not an error.
    async fn pull_request(&self, repo: &Repo, number: u64) -> Option<PullRequestSnapshot>;

    /// Lists pull requests of the configured repository in `state`.
    async fn pull_requests(&self, state: PullRequestState) -> Vec<PullRequestSnapshot>;

    /// All issue comments on `pr`, in thread order.
    async fn comments(&self, pr: &PullRequestSnapshot) -> Vec<Comment>;

    async fn post_comment(&self, pr: &PullRequestSnapshot, body: &str) -> anyhow::Result<()>;

    /// Posts a commit status against the PR's head sha.
    async fn post_status(
        &self,
        pr: &PullRequestSnapshot,
        target_url: &str,
        state: CommitState,
    ) -> anyhow::Result<()>;

    async fn labels(&self, pr: &PullRequestSnapshot) -> Vec<String>;

    async fn add_label(&self, pr: &PullRequestSnapshot, label: &str) -> anyhow::Result<()>;

    async fn remove_label(&self, pr: &PullRequestSnapshot, label: &str) -> anyhow::Result<()>;

    /// Whether `pr` has been merged. Uses the explicit merge-state
    /// query, falling back to scanning comments for a "merged" keyword
    /// when the query is inconclusive. Open PRs are never merged.
    async fn is_merged(&self, pr: &PullRequestSnapshot) -> bool;
}

/// Octocrab-backed gateway bound to one configured repository.
pub struct OctocrabGateway {
    client: Octocrab,
    repo: Repo,
    login: String,
}

impl OctocrabGateway {
    pub fn new(client: Octocrab, repo: Repo, login: impl Into<String>) -> Self {
        Self {
            client,
            repo,
            login: login.into(),
        }
    }

    /// Builds the gateway from `github.organization`, `github.repo`,
    /// and `github.login`; `github.token` is optional and enables
    /// authenticated calls.
    pub fn from_properties(props: &Properties) -> anyhow::Result<Self> {
        let organization = props.require("github.organization")?;
        let repo_name = props.require("github.repo")?;
        let login = props.require("github.login")?;
        let repo = Repo::new(organization, repo_name)?;

        let client = match props.get("github.token").filter(|token| !token.is_empty()) {
            Some(token) => Octocrab::builder().personal_token(token.to_string()).build()?,
            None => Octocrab::builder().build()?,
        };

        Ok(Self::new(client, repo, login))
    }

    /// The login the gateway authenticates as.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Per-PR operations address the PR's own repository; listing uses
    /// the configured one.
    fn repo_of(&self, pr: &PullRequestSnapshot) -> Repo {
        pr.repo().unwrap_or_else(|| {
            warn!(url = %pr.url, "cannot derive repository from PR URL, using configured repository");
            self.repo.clone()
        })
    }

    async fn collect_pull_requests(
        &self,
        state: PullRequestState,
    ) -> Result<Vec<PullRequestSnapshot>, octocrab::Error> {
        let list_state = match state {
            PullRequestState::Open => octocrab::params::State::Open,
            PullRequestState::Closed => octocrab::params::State::Closed,
        };
        let page = self
            .client
            .pulls(self.repo.org(), self.repo.name())
            .list()
            .state(list_state)
            .per_page(100)
            .send()
            .await?;
        let prs = self.client.all_pages(page).await?;
        Ok(prs.into_iter().map(snapshot_from_api).collect())
    }

    async fn collect_comments(
        &self,
        repo: &Repo,
        number: u64,
    ) -> Result<Vec<Comment>, octocrab::Error> {
        let page = self
            .client
            .issues(repo.org(), repo.name())
            .list_comments(number)
            .per_page(100)
            .send()
            .await?;
        let comments = self.client.all_pages(page).await?;
        Ok(comments
            .into_iter()
            .map(|comment| Comment {
                body: comment.body.unwrap_or_default(),
                created_at: comment.created_at,
            })
            .collect())
    }
}

fn snapshot_from_api(pr: octocrab::models::pulls::PullRequest) -> PullRequestSnapshot {
    PullRequestSnapshot {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: pr.body.unwrap_or_default(),
        state: match pr.state {
            Some(IssueState::Open) => PullRequestState::Open,
            _ => PullRequestState::Closed,
        },
        url: pr.url,
        html_url: pr.html_url.map(|url| url.to_string()).unwrap_or_default(),
        head_sha: pr.head.sha,
        base_ref: pr.base.ref_field,
        user: pr.user.map(|user| user.login).unwrap_or_default(),
        updated_at: pr.updated_at,
        milestone: pr.milestone.map(|milestone| Milestone {
            title: milestone.title,
        }),
    }
}

#[async_trait]
impl RepoGateway for OctocrabGateway {
    async fn pull_request(&self, repo: &Repo, number: u64) -> Option<PullRequestSnapshot> {
        match self
            .client
            .pulls(repo.org(), repo.name())
            .get(number)
            .await
        {
            Ok(pr) => Some(snapshot_from_api(pr)),
            Err(err) => {
                warn!(%repo, number, %err, "could not retrieve pull request");
                None
            }
        }
    }

    async fn pull_requests(&self, state: PullRequestState) -> Vec<PullRequestSnapshot> {
        match self.collect_pull_requests(state).await {
            Ok(prs) => prs,
            Err(err) => {
                warn!(repo = %self.repo, state = state.as_str(), %err, "could not list pull requests");
                Vec::new()
            }
        }
    }

    async fn comments(&self, pr: &PullRequestSnapshot) -> Vec<Comment> {
        let repo = self.repo_of(pr);
        match self.collect_comments(&repo, pr.number).await {
            Ok(comments) => comments,
            Err(err) => {
                warn!(%repo, number = pr.number, %err, "could not retrieve comments");
                Vec::new()
            }
        }
    }

    async fn post_comment(&self, pr: &PullRequestSnapshot, body: &str) -> anyhow::Result<()> {
        let repo = self.repo_of(pr);
        self.client
            .issues(repo.org(), repo.name())
            .create_comment(pr.number, body)
            .await?;
        Ok(())
    }

    async fn post_status(
        &self,
        pr: &PullRequestSnapshot,
        target_url: &str,
        state: CommitState,
    ) -> anyhow::Result<()> {
        let repo = self.repo_of(pr);
        let route = format!(
            "/repos/{}/{}/statuses/{}",
            repo.org(),
            repo.name(),
            pr.head_sha
        );
        let body = serde_json::json!({
            "state": state.as_str(),
            "target_url": target_url,
        });
        let _: serde_json::Value = self.client.post(route, Some(&body)).await?;
        Ok(())
    }

    async fn labels(&self, pr: &PullRequestSnapshot) -> Vec<String> {
        let repo = self.repo_of(pr);
        let page = match self
            .client
            .issues(repo.org(), repo.name())
            .list_labels_for_issue(pr.number)
            .per_page(100)
            .send()
            .await
        {
            Ok(page) => page,
            Err(err) => {
                warn!(%repo, number = pr.number, %err, "could not retrieve labels");
                return Vec::new();
            }
        };
        match self.client.all_pages(page).await {
            Ok(labels) => labels.into_iter().map(|label| label.name).collect(),
            Err(err) => {
                warn!(%repo, number = pr.number, %err, "could not retrieve labels");
                Vec::new()
            }
        }
    }

    async fn add_label(&self, pr: &PullRequestSnapshot, label: &str) -> anyhow::Result<()> {
        let repo = self.repo_of(pr);
        self.client
            .issues(repo.org(), repo.name())
            .add_labels(pr.number, &[label.to_string()])
            .await?;
        Ok(())
    }

    async fn remove_label(&self, pr: &PullRequestSnapshot, label: &str) -> anyhow::Result<()> {
        let repo = self.repo_of(pr);
        self.client
            .issues(repo.org(), repo.name())
            .remove_label(pr.number, label)
            .await?;
        Ok(())
    }

    async fn is_merged(&self, pr: &PullRequestSnapshot) -> bool {
        if pr.state != PullRequestState::Closed {
            return false;
        }

        let repo = self.repo_of(pr);
        match self
            .client
            .pulls(repo.org(), repo.name())
            .is_merged(pr.number)
            .await
        {
            Ok(merged) => merged,
            Err(err) => {
                // Merge-state query was inconclusive; a "merged" keyword
                // in the discussion is the signal of last resort.
                warn!(%repo, number = pr.number, %err, "merge-state query failed, scanning comments");
                self.comments(pr)
                    .await
                    .iter()
                    .any(|comment| comment.body.to_lowercase().contains("merged"))
            }
        }
    }
}
