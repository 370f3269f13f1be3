use std::path;

use chrono::NaiveDateTime;
use log::warn;

use crate::changelog;
use crate::changelog::ChangelogContext;
use crate::clients::git::GitClient;
use crate::clients::http::HttpClient;
use crate::clients::issues::IssueClient;
use crate::clients::runner::CommandRunner;
use crate::config::Config;
use crate::error::EnrichError;
use crate::error::FlowError;
use crate::error::FlowResult;
use crate::naming::BranchName;
use crate::naming::Family;
use crate::prompt::Prompter;

/// Most dated branches a family keeps before `rotate` offers to prune.
pub const MAX_DATED_BRANCHES: usize = 3;

/// Everything a command runs against: configuration and the injected
/// process, network and terminal capabilities.
pub struct App<R, H, P> {
    pub config: Config,
    pub git: GitClient<R>,
    pub http: H,
    pub prompter: P,
    /// Repository root, where `changelog/` lives.
    pub path: path::PathBuf,
    /// Wall-clock time the invocation started.
    pub now: NaiveDateTime,
}

impl<R: CommandRunner, H: HttpClient, P: Prompter> App<R, H, P> {
    pub fn new(config: Config, runner: R, http: H, prompter: P, path: path::PathBuf) -> Self {
        Self {
            config,
            git: GitClient::new(runner),
            http,
            prompter,
            path,
            now: chrono::Local::now().naive_local(),
        }
    }

    /// Pin the clock, for dated branch names and changelogs.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    /// Ask a yes/no question; a "no" aborts the command with `reason`.
    pub(crate) fn confirm_or_abort(&self, question: &str, reason: String) -> FlowResult<()> {
        if self.prompter.confirm(question)? {
            Ok(())
        } else {
            Err(FlowError::Aborted(reason))
        }
    }

    /// Open a URL with the platform's default handler.
    pub(crate) async fn open_in_browser(&self, url: &str) -> FlowResult<()> {
        let (program, args) = browser_command(std::env::consts::OS, url);
        self.git.runner().run(program, &args).await?;
        Ok(())
    }

    /// Render and write `changelog/<branch>.md` for a freshly started branch.
    ///
    /// Returns `Ok(None)` when the repository has no `changelog/` directory.
    /// A failed issue lookup only drops the issue details.
    pub(crate) async fn write_changelog(
        &self,
        family: &Family,
        branch: &BranchName,
    ) -> Result<Option<path::PathBuf>, EnrichError> {
        if !changelog::enabled(&self.path).await {
            return Ok(None);
        }

        let issue = match (&branch.ticket, &self.config.issue_tracker_token) {
            (Some(ticket), Some(token)) => {
                let issues = IssueClient::new(&self.http, &self.config.issue_tracker_url, token);
                match issues.issue(ticket).await {
                    Ok(issue) => Some(issue),
                    Err(err) => {
                        warn!("{}", EnrichError::Issue(err));
                        None
                    }
                }
            }
            _ => None,
        };

        let context = ChangelogContext {
            branch: branch.name.clone(),
            family: family.to_string(),
            name: branch.slug.clone(),
            ticket: branch.ticket.clone(),
            date: self.now.format("%Y-%m-%d").to_string(),
            issue,
        };
        let template = changelog::load_template(&self.path).await;
        let contents = changelog::render(&template, &context)?;
        let path = changelog::write(&self.path, &branch.name, &contents).await?;
        Ok(Some(path))
    }
}

/// Program and arguments that open `url` on `os`.
///
/// Windows goes through the URL protocol handler directly; `cmd /c start`
/// would split the URL at `&`.
fn browser_command<'a>(os: &str, url: &'a str) -> (&'static str, Vec<&'a str>) {
    match os {
        "macos" => ("open", vec![url]),
        "windows" => ("rundll32", vec!["url.dll,FileProtocolHandler", url]),
        _ => ("xdg-open", vec![url]),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;

    use super::App;
    use crate::clients::http::MockHttpClient;
    use crate::clients::runner::FakeRunner;
    use crate::config::Config;
    use crate::prompt::FakePrompter;

    /// An app on fakes with the clock pinned to 2024-03-01 09:30:00.
    pub fn app(
        config: Config,
        runner: FakeRunner,
        http: MockHttpClient,
        prompter: FakePrompter,
        path: &std::path::Path,
    ) -> App<FakeRunner, MockHttpClient, FakePrompter> {
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|date| date.and_hms_opt(9, 30, 0))
            .expect("valid date");
        App::new(config, runner, http, prompter, path.to_path_buf()).with_now(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_command_keeps_query_string_intact() {
        let url = "https://bitbucket.org/acme/widget/pull-requests/new?source=feature_x&t=1";
        for os in ["linux", "macos", "windows"] {
            let (program, args) = browser_command(os, url);
            assert_ne!(program, "cmd");
            assert_eq!(args.last(), Some(&url));
        }
        assert_eq!(browser_command("windows", url).0, "rundll32");
        assert_eq!(browser_command("freebsd", url).0, "xdg-open");
    }
}
