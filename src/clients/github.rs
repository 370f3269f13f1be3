use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use tracing::instrument;

use super::http::HttpClient;

const GITHUB_API: &str = "https://api.github.com";

// -----------------------------------------------------------------------------
// Types

/// Client to open pull requests through the GitHub REST API.
pub struct GithubClient<'a, H> {
    http: &'a H,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    html_url: String,
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

// -----------------------------------------------------------------------------
// GithubClient impl

impl<'a, H: HttpClient> GithubClient<'a, H> {
    pub fn new(http: &'a H, token: &'a str) -> Self {
        Self { http, token }
    }

    /// Create a new PR and return the PR URL
    #[instrument(skip(self, body))]
    pub async fn pr_create(
        &self,
        owner_repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        let url = format!("{GITHUB_API}/repos/{owner_repo}/pulls");
        let request_body = CreatePullRequest {
            title,
            body,
            head,
            base,
        };

        let json_data = serde_json::to_string(&request_body)?;
        let response = self
            .http
            .post_json(&url, &format!("Bearer {}", self.token), &json_data)
            .await?;
        let pr: PullRequest = serde_json::from_str(&response)?;
        Ok(pr.html_url)
    }
}
