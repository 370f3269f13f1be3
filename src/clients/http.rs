#![allow(async_fn_in_trait)]

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

const USER_AGENT: &str = "User-Agent: gitfeatures";

// -----------------------------------------------------------------------------
// HttpClient trait

/// Minimal HTTP capability: JSON POSTs with an `Authorization` header.
#[cfg_attr(test, automock)]
pub trait HttpClient {
    /// POST `body` as JSON and return the response body.
    ///
    /// `authorization` is the full header value, e.g. `Bearer <token>`.
    /// Responses with a status of 400 or above are errors.
    async fn post_json(&self, url: &str, authorization: &str, body: &str) -> Result<String>;
}

// -----------------------------------------------------------------------------
// CurlClient

/// HTTP client that shells out to curl
pub struct CurlClient;

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl HttpClient for CurlClient {
    async fn post_json(&self, url: &str, authorization: &str, body: &str) -> Result<String> {
        debug!("POST {url}");
        let output = Command::new("curl")
            .args([
                "-s",
                "-w",
                "\n%{http_code}",
                "-X",
                "POST",
                "-H",
                &format!("Authorization: {authorization}"),
                "-H",
                "Accept: application/json",
                "-H",
                "Content-Type: application/json",
                "-H",
                USER_AGENT,
                "-d",
                body,
                url,
            ])
            .output()
            .await
            .context("Failed to execute curl command")?;

        if !output.status.success() {
            bail!(
                "curl command failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        parse_response(output.stdout)
    }
}

/// Split curl's output into body and the status code appended by `-w`.
fn parse_response(stdout: Vec<u8>) -> Result<String> {
    let output_str = String::from_utf8(stdout)?;
    let (response, status) = output_str.rsplit_once('\n').unwrap_or(("", &output_str));
    let status_code = status.trim().parse::<u16>().unwrap_or(0);

    if status_code >= 400 {
        if let Ok(error) = serde_json::from_str::<ApiError>(response) {
            bail!("API error ({status_code}): {}", error.message);
        }
        bail!("API request failed with status {status_code}: {response}");
    }

    Ok(response.to_string())
}
