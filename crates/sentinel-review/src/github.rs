use async_trait::async_trait;
use sentinel_core::{RepoSlug, ReviewEvent, SentinelError};
use serde::Deserialize;

/// Title and description of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestInfo {
    /// Pull request title.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Pull request body; GitHub sends `null` for an empty description.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The source-hosting operations the workflows need.
///
/// Implemented by [`GitHubClient`]; tests substitute an in-memory host.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch title and body of a pull request.
    async fn get_pull_request(&self, repo: &RepoSlug, number: u64)
        -> Result<PullRequestInfo, SentinelError>;

    /// Replace the body of a pull request.
    async fn update_body(&self, repo: &RepoSlug, number: u64, body: &str)
        -> Result<(), SentinelError>;

    /// Post a comment on the pull request's conversation.
    async fn create_comment(&self, repo: &RepoSlug, number: u64, body: &str)
        -> Result<(), SentinelError>;

    /// Submit a review with an approve or request-changes event.
    async fn create_review(
        &self,
        repo: &RepoSlug,
        number: u64,
        event: ReviewEvent,
        body: &str,
    ) -> Result<(), SentinelError>;
}

/// GitHub REST client for reading pull requests and posting results.
///
/// # Examples
///
/// ```no_run
/// use sentinel_review::github::GitHubClient;
///
/// let client = GitHubClient::new("ghp_xxxx").unwrap();
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal or Actions token.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Platform`] if the client cannot be built.
    pub fn new(token: &str) -> Result<Self, SentinelError> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| SentinelError::Platform(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab })
    }

    /// Create a client against a different API root, e.g. GitHub Enterprise.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Platform`] if `base_uri` is invalid or the
    /// client cannot be built.
    pub fn with_base_uri(token: &str, base_uri: &str) -> Result<Self, SentinelError> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(base_uri)
            .map_err(|e| SentinelError::Platform(format!("invalid GitHub API URL {base_uri}: {e}")))?
            .build()
            .map_err(|e| SentinelError::Platform(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab })
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn get_pull_request(
        &self,
        repo: &RepoSlug,
        number: u64,
    ) -> Result<PullRequestInfo, SentinelError> {
        let route = format!("/repos/{}/{}/pulls/{number}", repo.owner, repo.repo);
        self.octocrab
            .get(route, None::<&()>)
            .await
            .map_err(|e| SentinelError::Platform(format!("failed to fetch PR #{number}: {e}")))
    }

    async fn update_body(
        &self,
        repo: &RepoSlug,
        number: u64,
        body: &str,
    ) -> Result<(), SentinelError> {
        let route = format!("/repos/{}/{}/pulls/{number}", repo.owner, repo.repo);
        let payload = serde_json::json!({ "body": body });
        let _response: serde_json::Value = self
            .octocrab
            .patch(route, Some(&payload))
            .await
            .map_err(|e| SentinelError::Platform(format!("failed to update PR #{number}: {e}")))?;
        Ok(())
    }

    async fn create_comment(
        &self,
        repo: &RepoSlug,
        number: u64,
        body: &str,
    ) -> Result<(), SentinelError> {
        let route = format!("/repos/{}/{}/issues/{number}/comments", repo.owner, repo.repo);
        let payload = serde_json::json!({ "body": body });
        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| SentinelError::Platform(format!("failed to comment on #{number}: {e}")))?;
        Ok(())
    }

    async fn create_review(
        &self,
        repo: &RepoSlug,
        number: u64,
        event: ReviewEvent,
        body: &str,
    ) -> Result<(), SentinelError> {
        let route = format!("/repos/{}/{}/pulls/{number}/reviews", repo.owner, repo.repo);
        let payload = serde_json::json!({
            "event": event.as_str(),
            "body": body,
        });
        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| SentinelError::Platform(format!("failed to post review: {e}")))?;
        Ok(())
    }
}
