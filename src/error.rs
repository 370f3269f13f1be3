use std::path::PathBuf;

use thiserror::Error;

/// Result type returned by every workflow command.
pub type FlowResult<T> = Result<T, FlowError>;

/// Why a workflow command stopped.
///
/// Every variant is terminal for the invocation; the CLI turns it into a
/// message on stderr and a non-zero exit status.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("non-zero exit status executing: {command}\n{output}")]
    CommandFailed { command: String, output: String },

    #[error("failed to execute {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output of {command} is not valid UTF-8")]
    NonUtf8Output { command: String },

    #[error("{0}")]
    Precondition(String),

    #[error(
        "{branch} contains commits that are not in {main}:\n{commits}\nraise a pull request and get them merged in."
    )]
    UnmergedCommits {
        branch: String,
        main: String,
        commits: String,
    },

    #[error(
        "{output}\n\nYou have work to do. Fix the above conflicts and run git pullrequest again"
    )]
    MergeConflict { output: String },

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Failure of the best-effort changelog task.
///
/// These are logged and dropped; they never reach a command's result.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("issue lookup failed: {0:#}")]
    Issue(anyhow::Error),

    #[error("failed to render changelog template: {0}")]
    Render(#[from] minijinja::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
