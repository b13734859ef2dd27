pub mod github;

use async_trait::async_trait;

/// Outbound calls made to GitHub on behalf of the app installation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GithubService: Send + Sync {
    /// Posts a comment on an issue or pull request of `repo_full_name`.
    async fn comment_on_issue(
        &self,
        repo_full_name: &str,
        issue_number: u64,
        body: &str,
    ) -> anyhow::Result<()>;
}

pub type ImplGithubService = std::sync::Arc<dyn GithubService>;
