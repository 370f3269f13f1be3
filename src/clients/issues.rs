use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::http::HttpClient;

const ISSUE_QUERY: &str =
    "query Issue($id: String!) { issue(id: $id) { identifier title url description } }";

// -----------------------------------------------------------------------------
// Types

/// Client for the issue tracker's GraphQL API.
pub struct IssueClient<'a, H> {
    http: &'a H,
    url: &'a str,
    token: &'a str,
}

/// The parts of an issue that end up in a changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub identifier: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<IssueData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct IssueData {
    issue: Option<Issue>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

// -----------------------------------------------------------------------------
// IssueClient impl

impl<'a, H: HttpClient> IssueClient<'a, H> {
    pub fn new(http: &'a H, url: &'a str, token: &'a str) -> Self {
        Self { http, url, token }
    }

    /// Look up an issue by its identifier, e.g. `ENG-123`.
    #[instrument(skip(self))]
    pub async fn issue(&self, identifier: &str) -> Result<Issue> {
        let request = json!({
            "query": ISSUE_QUERY,
            "variables": { "id": identifier },
        });
        let response = self
            .http
            .post_json(self.url, self.token, &request.to_string())
            .await?;
        let response: GraphqlResponse =
            serde_json::from_str(&response).context("Malformed issue tracker response")?;

        if let Some(error) = response.errors.first() {
            bail!("issue tracker error: {}", error.message);
        }
        response
            .data
            .and_then(|data| data.issue)
            .with_context(|| format!("issue {identifier} not found"))
    }
}
