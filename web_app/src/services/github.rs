use anyhow::bail;
use async_trait::async_trait;
use serde_json::json;

use crate::{consts, utils};

#[derive(Clone)]
pub struct GithubHandler {
    pub api_base_url: String,
    pub installation_token: String,
}

impl GithubHandler {
    pub fn new(installation_token: &str) -> Self {
        Self {
            api_base_url: consts::GITHUB_API_BASE_URL.to_string(),
            installation_token: installation_token.to_string(),
        }
    }

    fn issue_comments_url(&self, repo_full_name: &str, issue_number: u64) -> String {
        format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_base_url.trim_end_matches('/'),
            repo_full_name,
            issue_number
        )
    }
}

/// Handles GitHub API error responses.
async fn handle_github_error_response(response: reqwest::Response) -> anyhow::Result<()> {
    let status = response.status();
    let error_body = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or_else(|_| json!({"error": "Unknown error"}));

    logfire::error!(
        "github_error={error} status={status}",
        error = error_body.to_string(),
        status = status.to_string()
    );

    bail!("GitHub API error ({}): {}", status, error_body)
}

#[async_trait]
impl crate::services::GithubService for GithubHandler {
    async fn comment_on_issue(
        &self,
        repo_full_name: &str,
        issue_number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        let response = utils::REQUEST_CLIENT
            .post(self.issue_comments_url(repo_full_name, issue_number))
            .header("accept", consts::GITHUB_API_ACCEPT)
            .header("user-agent", consts::HTTP_USER_AGENT)
            .bearer_auth(&self.installation_token)
            .json(&json!({ "body": body }))
            .send()
            .await?;

        if !response.status().is_success() {
            return handle_github_error_response(response).await;
        }

        Ok(())
    }
}
