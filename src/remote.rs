//! Remote URL parsing and pull request links.

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;

/// Hosting service the `origin` remote lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    Github,
    Bitbucket,
    Other(String),
}

impl Provider {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "github" => Self::Github,
            "bitbucket" => Self::Bitbucket,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether pull requests can be opened through the provider's REST API.
    pub fn supports_api(&self) -> bool {
        matches!(self, Self::Github)
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Github => f.write_str("github"),
            Self::Bitbucket => f.write_str("bitbucket"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

// scheme://[user@]host[:port]/owner/repo[.git]
static URL_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://(?:[^@/]+@)?[^/]+/(.+?)(?:\.git)?/?$")
        .expect("valid regex")
});

// [user@]host:owner/repo[.git]
static SCP_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/:]+@)?[^/:]+:(.+?)(?:\.git)?/?$").expect("valid regex")
});

/// Extract `owner/repo` from a remote URL.
///
/// Understands scp-style (`git@github.com:owner/repo.git`) and URL-style
/// (`https://github.com/owner/repo.git`) remotes. Anything else is returned
/// trimmed but otherwise untouched.
pub fn parse_owner_repo(remote_url: &str) -> String {
    let url = remote_url.trim();
    for re in [&*URL_STYLE, &*SCP_STYLE] {
        if let Some(caps) = re.captures(url)
            && let Some(path) = caps.get(1)
        {
            return path.as_str().to_string();
        }
    }
    url.to_string()
}

/// Build the web link that starts a pull request for `branch`.
///
/// Returns `None` for providers we don't know the URL scheme of.
pub fn build_pr_url(config: &Config, owner_repo: &str, branch: &str) -> Option<String> {
    match &config.provider {
        Provider::Github if config.private_fork_links => Some(format!(
            "https://github.com/{owner_repo}/compare/{}...{branch}?expand=1",
            config.main_branch
        )),
        Provider::Github => Some(format!(
            "https://github.com/{owner_repo}/pull/new/{branch}"
        )),
        Provider::Bitbucket => Some(format!(
            "https://bitbucket.org/{owner_repo}/pull-requests/new?source={branch}&t=1"
        )),
        Provider::Other(_) => None,
    }
}
