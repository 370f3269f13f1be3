//! Argument parsing and dispatch for every entry point.
//!
//! `gitfeatures` takes the family as its first subcommand. The `git-<family>`
//! binaries parse only the family's own arguments so they can be run as git
//! sub-commands (`git feature new login`).

use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use colored::Colorize as _;

use crate::App;
use crate::Config;
use crate::clients::http::CurlClient;
use crate::clients::http::HttpClient;
use crate::clients::runner::CommandRunner;
use crate::clients::runner::SystemRunner;
use crate::commands::Rotation;
use crate::error::FlowError;
use crate::error::FlowResult;
use crate::logging;
use crate::naming;
use crate::naming::Family;
use crate::prompt::Prompter;
use crate::prompt::TerminalPrompter;

#[derive(Parser)]
#[command(name = "gitfeatures")]
#[command(
    about = "Git sub-commands for a feature/hotfix/release branching workflow",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start or finish a feature branch
    Feature {
        #[command(subcommand)]
        action: BranchAction,
    },
    /// Start or finish a hotfix branch
    Hotfix {
        #[command(subcommand)]
        action: BranchAction,
    },
    /// Start or finish a release branch
    Release {
        #[command(subcommand)]
        action: BranchAction,
    },
    /// Start or finish a release candidate branch
    Releasecandidate {
        #[command(subcommand)]
        action: BranchAction,
    },
    /// Cut or finish a dated stable branch, or switch to the latest one
    Stable {
        #[command(subcommand)]
        action: Option<StableAction>,
    },
    /// Start or finish a branch of any other family, e.g. `spike`
    Branch {
        /// Family name, used as the branch prefix
        family: String,
        #[command(subcommand)]
        action: BranchAction,
    },
    /// Bring the current branch up to date and open a pull request for it
    Pullrequest {
        /// Print the pull request link instead of creating or opening it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum BranchAction {
    /// Create a branch off the main branch and push it
    New {
        /// Branch name; may embed a ticket, e.g. `eng-123-fix-login`
        name: Option<String>,
        /// Ticket id to put in the branch name
        ticket: Option<String>,
    },
    /// Delete a branch that has been merged into the main branch
    Finish {
        /// Branch to finish (defaults to the current branch)
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum StableAction {
    /// Cut a new dated branch
    New {
        /// Label after the date (defaults to the time of day)
        label: Option<String>,
    },
    /// Delete a dated branch that has been merged into the main branch
    Finish {
        /// Branch to finish (defaults to the current branch)
        name: Option<String>,
    },
}

#[derive(Parser)]
struct FamilyCli {
    #[command(subcommand)]
    action: BranchAction,
}

#[derive(Parser)]
struct StableCli {
    #[command(subcommand)]
    action: Option<StableAction>,
}

#[derive(Parser)]
struct PullrequestCli {
    /// Print the pull request link instead of creating or opening it
    #[arg(long)]
    dry_run: bool,
}

/// The binary the process was started as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Gitfeatures,
    Feature,
    Hotfix,
    Release,
    Releasecandidate,
    Stable,
    Pullrequest,
}

/// Parse the process arguments for `entry`. Exits on `--help` or bad usage.
pub fn parse(entry: Entry) -> Commands {
    match entry {
        Entry::Gitfeatures => Cli::parse().command,
        Entry::Feature => Commands::Feature {
            action: FamilyCli::parse().action,
        },
        Entry::Hotfix => Commands::Hotfix {
            action: FamilyCli::parse().action,
        },
        Entry::Release => Commands::Release {
            action: FamilyCli::parse().action,
        },
        Entry::Releasecandidate => Commands::Releasecandidate {
            action: FamilyCli::parse().action,
        },
        Entry::Stable => Commands::Stable {
            action: StableCli::parse().action,
        },
        Entry::Pullrequest => Commands::Pullrequest {
            dry_run: PullrequestCli::parse().dry_run,
        },
    }
}

/// Run `entry` against the current directory and map the outcome to an exit
/// status.
pub async fn run(entry: Entry) -> ExitCode {
    let command = parse(entry);
    match run_command(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "gitfeatures:".red());
            ExitCode::FAILURE
        }
    }
}

async fn run_command(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.debug)?;

    let path = std::env::current_dir()?;
    let app = App::new(
        config,
        SystemRunner::new(path.clone()),
        CurlClient,
        TerminalPrompter,
        path,
    );
    dispatch(&app, command, &mut std::io::stdout()).await?;
    Ok(())
}

/// Route a parsed command to the matching workflow.
pub async fn dispatch<R: CommandRunner, H: HttpClient, P: Prompter>(
    app: &App<R, H, P>,
    command: Commands,
    stdout: &mut impl std::io::Write,
) -> FlowResult<()> {
    match command {
        Commands::Feature { action } => branch_action(app, Family::Feature, action, stdout).await,
        Commands::Hotfix { action } => branch_action(app, Family::Hotfix, action, stdout).await,
        Commands::Release { action } => branch_action(app, Family::Release, action, stdout).await,
        Commands::Releasecandidate { action } => {
            branch_action(app, Family::ReleaseCandidate, action, stdout).await
        }
        Commands::Stable {
            action: Some(StableAction::Finish { name }),
        } => {
            app.cmd_finish(&Family::Stable, name.as_deref(), stdout)
                .await
        }
        Commands::Stable { action } => {
            let rotation = match action {
                Some(StableAction::New { label }) => Rotation::New(label),
                _ => Rotation::Latest,
            };
            app.cmd_rotate(&Family::Stable, &rotation, stdout).await
        }
        Commands::Branch { family, action } => {
            let family = naming::sanitize(family.trim());
            if family.is_empty() {
                return Err(FlowError::Precondition(
                    "a branch family name is required".to_string(),
                ));
            }
            branch_action(app, Family::parse(&family), action, stdout).await
        }
        Commands::Pullrequest { dry_run } => app.cmd_pullrequest(dry_run, stdout).await,
    }
}

async fn branch_action<R: CommandRunner, H: HttpClient, P: Prompter>(
    app: &App<R, H, P>,
    family: Family,
    action: BranchAction,
    stdout: &mut impl std::io::Write,
) -> FlowResult<()> {
    match action {
        BranchAction::New { name, ticket } => {
            let name = match name {
                Some(name) => name,
                None if family == Family::ReleaseCandidate => {
                    app.now.format("%Y-%m-%d").to_string()
                }
                None => {
                    return Err(FlowError::Precondition(format!(
                        "usage: git {family} new <name> [ticket]"
                    )));
                }
            };
            app.cmd_start(&family, &name, ticket.as_deref(), stdout)
                .await
        }
        BranchAction::Finish { name } => app.cmd_finish(&family, name.as_deref(), stdout).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::app;
    use crate::clients::http::MockHttpClient;
    use crate::clients::runner::FakeRunner;
    use crate::prompt::FakePrompter;

    fn parse_args(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_parse_branch_actions() {
        assert_eq!(
            parse_args(&["gitfeatures", "feature", "new", "login", "ENG-1"]),
            Commands::Feature {
                action: BranchAction::New {
                    name: Some("login".to_string()),
                    ticket: Some("ENG-1".to_string()),
                },
            }
        );
        assert_eq!(
            parse_args(&["gitfeatures", "hotfix", "finish"]),
            Commands::Hotfix {
                action: BranchAction::Finish { name: None },
            }
        );
    }

    #[test]
    fn test_parse_stable_and_pullrequest() {
        assert_eq!(
            parse_args(&["gitfeatures", "stable"]),
            Commands::Stable { action: None }
        );
        assert_eq!(
            parse_args(&["gitfeatures", "stable", "new", "hotfix"]),
            Commands::Stable {
                action: Some(StableAction::New {
                    label: Some("hotfix".to_string()),
                }),
            }
        );
        assert_eq!(
            parse_args(&["gitfeatures", "pullrequest", "--dry-run"]),
            Commands::Pullrequest { dry_run: true }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_family_action() {
        assert!(Cli::try_parse_from(["gitfeatures", "feature", "merge"]).is_err());
        assert!(FamilyCli::try_parse_from(["git-feature"]).is_err());
    }

    #[test]
    fn test_family_binary_parses_own_arguments() {
        let cli = FamilyCli::try_parse_from(["git-release", "new", "2.0"]).unwrap();
        assert_eq!(
            cli.action,
            BranchAction::New {
                name: Some("2.0".to_string()),
                ticket: None,
            }
        );
    }

    #[tokio::test]
    async fn test_dispatch_releasecandidate_defaults_to_today() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().with_stdout("git branch", "* main\n");
        let app = app(
            Config::default(),
            runner,
            MockHttpClient::new(),
            FakePrompter::new(),
            dir.path(),
        );

        let mut out = Vec::new();
        let command = parse_args(&["gitfeatures", "releasecandidate", "new"]);
        dispatch(&app, command, &mut out).await.unwrap();
        assert!(
            app.git
                .runner()
                .was_called("git checkout -b releasecandidate_2024-03-01")
        );
    }

    #[tokio::test]
    async fn test_dispatch_new_without_name_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            Config::default(),
            FakeRunner::new(),
            MockHttpClient::new(),
            FakePrompter::new(),
            dir.path(),
        );

        let mut out = Vec::new();
        let command = parse_args(&["gitfeatures", "feature", "new"]);
        let err = dispatch(&app, command, &mut out).await.unwrap_err();
        assert_eq!(err.to_string(), "usage: git feature new <name> [ticket]");
        assert!(app.git.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_stable_without_action_checks_out_latest() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().with_stdout(
            "git branch -r",
            "  origin/stable_20240101_1000\n  origin/stable_20240301_0930\n",
        );
        let app = app(
            Config::default(),
            runner,
            MockHttpClient::new(),
            FakePrompter::new(),
            dir.path(),
        );

        let mut out = Vec::new();
        dispatch(&app, Commands::Stable { action: None }, &mut out)
            .await
            .unwrap();
        insta::assert_snapshot!(
            String::from_utf8(out).unwrap(),
            @"Switched to stable_20240301_0930"
        );
    }

    #[test]
    fn test_parse_stable_finish() {
        assert_eq!(
            parse_args(&["gitfeatures", "stable", "finish", "20240101_x"]),
            Commands::Stable {
                action: Some(StableAction::Finish {
                    name: Some("20240101_x".to_string()),
                }),
            }
        );
        let cli = StableCli::try_parse_from(["git-stable", "finish"]).unwrap();
        assert_eq!(cli.action, Some(StableAction::Finish { name: None }));
    }

    #[tokio::test]
    async fn test_dispatch_stable_finish_deletes_dated_branch() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().with_stdout("git branch", "* main\n");
        let app = app(
            Config::default(),
            runner,
            MockHttpClient::new(),
            FakePrompter::new(),
            dir.path(),
        );

        let mut out = Vec::new();
        let command = parse_args(&["gitfeatures", "stable", "finish", "20240101_x"]);
        dispatch(&app, command, &mut out).await.unwrap();

        let runner = app.git.runner();
        assert!(runner.was_called("git log --oneline stable_20240101_x ^origin/main"));
        assert!(runner.was_called("git push origin --delete stable_20240101_x"));
        assert!(runner.was_called("git branch -D stable_20240101_x"));
        assert!(!runner.was_called("git branch -r"));
    }

    #[tokio::test]
    async fn test_dispatch_custom_family() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new().with_stdout("git branch", "* main\n");
        let app = app(
            Config::default(),
            runner,
            MockHttpClient::new(),
            FakePrompter::new(),
            dir.path(),
        );

        let command = parse_args(&["gitfeatures", "branch", "spike", "new", "cache layer"]);
        assert_eq!(
            command,
            Commands::Branch {
                family: "spike".to_string(),
                action: BranchAction::New {
                    name: Some("cache layer".to_string()),
                    ticket: None,
                },
            }
        );

        let mut out = Vec::new();
        dispatch(&app, command, &mut out).await.unwrap();
        assert!(app.git.runner().was_called("git checkout -b spike_cache_layer"));
        insta::assert_snapshot!(
            String::from_utf8(out).unwrap(),
            @"Created spike_cache_layer and pushed it to origin"
        );
    }
}
