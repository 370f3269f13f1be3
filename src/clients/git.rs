use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use tracing::instrument;

use super::runner::CommandRunner;
use crate::error::FlowError;
use crate::error::FlowResult;

// -----------------------------------------------------------------------------
// Types

/// Git client.
///
/// Every method is a single git invocation (or a short fixed sequence) run
/// through the injected [`CommandRunner`].
pub struct GitClient<R> {
    runner: R,
}

/// Outcome of merging or rebasing the main branch into the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Clean(String),
    Conflict(String),
}

static CURRENT_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\* (.+)$").expect("valid regex"));

// -----------------------------------------------------------------------------
// Output parsing

/// Pick the branch marked with `*` out of `git branch` output.
pub fn parse_current_branch(listing: &str) -> Option<String> {
    let caps = CURRENT_BRANCH.captures(listing)?;
    let branch = caps.get(1)?.as_str().trim();
    // "(HEAD detached at abc123)" is not a branch
    if branch.is_empty() || branch.starts_with('(') {
        return None;
    }
    Some(branch.to_string())
}

/// Whether any line of `git branch -a` output names `branch`, locally or
/// under a remote.
pub fn listing_contains(listing: &str, branch: &str) -> bool {
    listing.lines().any(|line| {
        let line = line.trim_end();
        let Some(head) = line.strip_suffix(branch) else {
            return false;
        };
        head.is_empty() || head.ends_with('/') || head.ends_with(' ')
    })
}

/// Filter `git branch -r` output down to dated branches of one family.
///
/// Matches `origin/<family><sep><8 digits>...`, strips the remote and keeps
/// the listed order.
pub fn parse_family_branches(listing: &str, family: &str, separator: &str) -> Vec<String> {
    let pattern = format!(
        r"^origin/({}{}\d{{8}}\S*)$",
        regex::escape(family),
        regex::escape(separator)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    listing
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// -----------------------------------------------------------------------------
// GitClient impl

impl<R: CommandRunner> GitClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn git(&self, args: &[&str]) -> FlowResult<String> {
        self.runner.run("git", args).await
    }

    /// Refresh remote-tracking branches from origin.
    #[instrument(skip_all)]
    pub async fn remote_update(&self) -> FlowResult<()> {
        self.git(&["remote", "update", "origin"]).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn current_branch(&self) -> FlowResult<String> {
        let listing = self.git(&["branch"]).await?;
        parse_current_branch(&listing)
            .ok_or_else(|| FlowError::Precondition("unable to detect current branch".to_string()))
    }

    /// Check whether a local or remote branch with this name exists.
    #[instrument(skip(self))]
    pub async fn branch_exists(&self, branch: &str) -> FlowResult<bool> {
        let listing = self.git(&["branch", "-a"]).await?;
        Ok(listing_contains(&listing, branch))
    }

    /// List the dated remote branches of a family, oldest first.
    ///
    /// A failing listing yields an empty list rather than an error.
    #[instrument(skip(self))]
    pub async fn list_family_branches(
        &self,
        family: &str,
        separator: &str,
    ) -> FlowResult<Vec<String>> {
        self.remote_update().await?;
        let output = self.runner.output("git", &["branch", "-r"]).await?;
        if !output.success {
            debug!("remote branch listing failed: {}", output.combined());
            return Ok(Vec::new());
        }
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(parse_family_branches(&listing, family, separator))
    }

    pub async fn checkout(&self, branch: &str) -> FlowResult<()> {
        self.git(&["checkout", branch]).await?;
        Ok(())
    }

    /// Create a branch from HEAD and switch to it.
    pub async fn create_branch(&self, branch: &str) -> FlowResult<()> {
        self.git(&["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Push a branch to origin and set it as upstream.
    pub async fn push_upstream(&self, branch: &str) -> FlowResult<()> {
        let refspec = format!("{branch}:{branch}");
        self.git(&["push", "-u", "origin", &refspec]).await?;
        Ok(())
    }

    pub async fn push(&self, branch: &str) -> FlowResult<()> {
        let refspec = format!("{branch}:{branch}");
        self.git(&["push", "origin", &refspec]).await?;
        Ok(())
    }

    /// Push a branch whose history was rewritten, refusing if origin moved
    /// since the last fetch.
    pub async fn push_force_with_lease(&self, branch: &str) -> FlowResult<()> {
        let refspec = format!("{branch}:{branch}");
        self.git(&["push", "--force-with-lease", "origin", &refspec])
            .await?;
        Ok(())
    }

    /// Delete a remote branch
    pub async fn delete_remote_branch(&self, branch: &str) -> FlowResult<()> {
        self.git(&["push", "origin", "--delete", branch]).await?;
        Ok(())
    }

    /// Whether a local branch with exactly this name exists.
    #[instrument(skip(self))]
    pub async fn local_branch_exists(&self, branch: &str) -> FlowResult<bool> {
        let listing = self.git(&["branch", "--list", branch]).await?;
        Ok(!listing.trim().is_empty())
    }

    pub async fn delete_local_branch(&self, branch: &str) -> FlowResult<()> {
        self.git(&["branch", "-D", branch]).await?;
        Ok(())
    }

    /// One-line log of commits reachable from `include` but not from
    /// `exclude`. Empty when there are none.
    pub async fn commits_not_in(&self, include: &str, exclude: &str) -> FlowResult<String> {
        let exclude = format!("^{exclude}");
        let log = self.git(&["log", "--oneline", include, &exclude]).await?;
        Ok(log.trim_end().to_string())
    }

    pub async fn pull(&self) -> FlowResult<()> {
        self.git(&["pull"]).await?;
        Ok(())
    }

    /// Merge `branch` into the current branch.
    pub async fn merge(&self, branch: &str) -> FlowResult<SyncOutcome> {
        self.sync("merge", branch).await
    }

    /// Rebase the current branch onto `branch`.
    pub async fn rebase(&self, branch: &str) -> FlowResult<SyncOutcome> {
        self.sync("rebase", branch).await
    }

    async fn sync(&self, verb: &str, branch: &str) -> FlowResult<SyncOutcome> {
        let output = self.runner.output("git", &[verb, branch]).await?;
        let text = output.combined();
        if output.success {
            return Ok(SyncOutcome::Clean(text));
        }
        if text.contains("CONFLICT") {
            return Ok(SyncOutcome::Conflict(text));
        }
        Err(FlowError::CommandFailed {
            command: format!("git {verb} {branch}"),
            output: text,
        })
    }

    /// URL of the `origin` remote.
    pub async fn remote_url(&self) -> FlowResult<String> {
        let url = self
            .git(&["config", "--get", "remote.origin.url"])
            .await?;
        Ok(url.trim().to_string())
    }
}
