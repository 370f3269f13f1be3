use log::warn;

use crate::App;
use crate::changelog;
use crate::clients::git::SyncOutcome;
use crate::clients::github::GithubClient;
use crate::clients::http::HttpClient;
use crate::clients::runner::CommandRunner;
use crate::config::MergeStrategy;
use crate::error::FlowError;
use crate::error::FlowResult;
use crate::prompt::Prompter;
use crate::remote;

impl<R: CommandRunner, H: HttpClient, P: Prompter> App<R, H, P> {
    /// Get the current branch ready for review and open a pull request.
    ///
    /// 1. Offer to bring the branch up to date with `origin/<main>`.
    /// 2. Offer to push commits origin doesn't have yet.
    /// 3. With a GitHub token, create the PR through the API.
    /// 4. Otherwise, or if that fails, print the PR link (dry run and
    ///    console-only mode) or open it in a browser.
    pub async fn cmd_pullrequest(
        &self,
        dry_run: bool,
        stdout: &mut impl std::io::Write,
    ) -> FlowResult<()> {
        let main = &self.config.main_branch;
        let branch = self.git.current_branch().await?;
        if &branch == main {
            return Err(FlowError::Precondition(format!(
                "can't issue pull requests on {main}"
            )));
        }

        self.git.remote_update().await?;
        let rebased = self.sync_with_main(&branch, stdout).await?;

        let unpushed = self
            .git
            .commits_not_in(&branch, &format!("origin/{branch}"))
            .await?;
        if !unpushed.is_empty() {
            writeln!(stdout, "You have unpushed commits:")?;
            writeln!(stdout, "{unpushed}")?;
            if self.prompter.confirm("Push commits to origin?")? {
                // A rebase rewrote commits origin already has
                if rebased {
                    self.git.push_force_with_lease(&branch).await?;
                } else {
                    self.git.push(&branch).await?;
                }
            }
        }

        let owner_repo = remote::parse_owner_repo(&self.git.remote_url().await?);

        if !dry_run
            && self.config.provider.supports_api()
            && let Some(token) = &self.config.github_token
        {
            let title = pr_title(&branch, &self.config.branch_separator);
            let body = changelog::read(&self.path, &branch).await.unwrap_or_default();
            let gh = GithubClient::new(&self.http, token);
            match gh.pr_create(&owner_repo, &branch, main, &title, &body).await {
                Ok(url) => {
                    writeln!(stdout, "Created pull request: {url}")?;
                    return Ok(());
                }
                Err(err) => warn!("Could not create pull request through the API: {err:#}"),
            }
        }

        let Some(url) = remote::build_pr_url(&self.config, &owner_repo, &branch) else {
            return Err(FlowError::Precondition(format!(
                "don't know how to link pull requests for provider '{}'",
                self.config.provider
            )));
        };

        if dry_run || self.config.console_only {
            writeln!(stdout, "{url}")?;
        } else {
            writeln!(stdout, "Opening {url}")?;
            self.open_in_browser(&url).await?;
        }

        Ok(())
    }

    /// Offer to merge (or rebase onto) the main branch when the branch is
    /// behind `origin/<main>`.
    ///
    /// Returns whether the branch was rebased.
    async fn sync_with_main(
        &self,
        branch: &str,
        stdout: &mut impl std::io::Write,
    ) -> FlowResult<bool> {
        let main = &self.config.main_branch;
        let origin_main = self.config.origin_main();
        let behind = self.git.commits_not_in(&origin_main, branch).await?;
        if behind.is_empty() {
            return Ok(false);
        }

        let strategy = self.config.merge_strategy;
        writeln!(
            stdout,
            "Your branch is behind {origin_main} so cannot be automatically merged."
        )?;
        writeln!(stdout, "{behind}")?;
        if !self.prompter.confirm(&format!(
            "Update {main} and {} it into {branch}? (conflicts can be fixed afterwards)",
            strategy.as_str()
        ))? {
            return Ok(false);
        }

        self.git.checkout(main).await?;
        self.git.pull().await?;
        self.git.checkout(branch).await?;
        writeln!(stdout, "git {} {main}", strategy.as_str())?;
        let outcome = match strategy {
            MergeStrategy::Merge => self.git.merge(main).await?,
            MergeStrategy::Rebase => self.git.rebase(main).await?,
        };
        match outcome {
            SyncOutcome::Clean(output) => {
                if !output.is_empty() {
                    writeln!(stdout, "{output}")?;
                }
                match strategy {
                    MergeStrategy::Merge => writeln!(stdout, "Successfully merged {main}")?,
                    MergeStrategy::Rebase => {
                        writeln!(stdout, "Successfully rebased onto {main}")?
                    }
                }
                Ok(strategy == MergeStrategy::Rebase)
            }
            SyncOutcome::Conflict(output) => Err(FlowError::MergeConflict { output }),
        }
    }
}

/// `feature_login_form` becomes `feature: login_form`.
fn pr_title(branch: &str, separator: &str) -> String {
    match branch.split_once(separator) {
        Some((family, rest)) if !rest.is_empty() => format!("{family}: {rest}"),
        _ => branch.to_string(),
    }
}
