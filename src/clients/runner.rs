#![allow(async_fn_in_trait)]

use std::path;

use tokio::process::Command;
use tracing::debug;

use crate::error::FlowError;
use crate::error::FlowResult;

// -----------------------------------------------------------------------------
// Types

/// Raw result of an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    pub fn failed(stdout: &str, stderr: &str) -> Self {
        Self {
            success: false,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    /// stdout followed by stderr, decoded lossily.
    pub fn combined(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text.trim_end().to_string()
    }
}

/// Render an invocation the way a shell user would type it.
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

// -----------------------------------------------------------------------------
// CommandRunner trait

/// Runs external programs, one at a time, waiting for each to finish.
pub trait CommandRunner {
    /// Run a program and hand back its raw output, whatever the exit status.
    async fn output(&self, program: &str, args: &[&str]) -> FlowResult<CommandOutput>;

    /// Run a program and return its stdout.
    ///
    /// A non-zero exit status becomes [`FlowError::CommandFailed`] carrying
    /// the command line and everything it printed.
    async fn run(&self, program: &str, args: &[&str]) -> FlowResult<String> {
        let output = self.output(program, args).await?;
        if !output.success {
            return Err(FlowError::CommandFailed {
                command: render_command(program, args),
                output: output.combined(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| FlowError::NonUtf8Output {
            command: render_command(program, args),
        })
    }
}

// -----------------------------------------------------------------------------
// SystemRunner

/// Spawns real processes in the repository directory.
pub struct SystemRunner {
    path: path::PathBuf,
}

impl SystemRunner {
    pub fn new(path: path::PathBuf) -> Self {
        Self { path }
    }
}

impl CommandRunner for SystemRunner {
    async fn output(&self, program: &str, args: &[&str]) -> FlowResult<CommandOutput> {
        let command = render_command(program, args);
        debug!("running: {command}");

        let output = Command::new(program)
            .current_dir(&self.path)
            .args(args)
            .output()
            .await
            .map_err(|source| FlowError::CommandSpawn {
                command: command.clone(),
                source,
            })?;

        debug!("{command} exited with {}", output.status);
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

// -----------------------------------------------------------------------------
// FakeRunner

/// Answers commands from a script and records every invocation.
///
/// Commands are matched on their rendered command line. When several answers
/// are queued for one command they are handed out in order and the last one
/// sticks. Unscripted commands succeed with empty output.
#[cfg(test)]
pub struct FakeRunner {
    pub responses: std::cell::RefCell<
        std::collections::HashMap<String, std::collections::VecDeque<CommandOutput>>,
    >,
    pub calls: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl FakeRunner {
    pub fn new() -> Self {
        Self {
            responses: std::cell::RefCell::new(std::collections::HashMap::new()),
            calls: std::cell::RefCell::new(Vec::new()),
        }
    }

    pub fn with(self, command: &str, output: CommandOutput) -> Self {
        self.responses
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn with_stdout(self, command: &str, stdout: &str) -> Self {
        self.with(command, CommandOutput::ok(stdout))
    }

    pub fn with_failure(self, command: &str, stderr: &str) -> Self {
        self.with(command, CommandOutput::failed("", stderr))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.calls.borrow().iter().any(|c| c == command)
    }
}

#[cfg(test)]
impl CommandRunner for FakeRunner {
    async fn output(&self, program: &str, args: &[&str]) -> FlowResult<CommandOutput> {
        let command = render_command(program, args);
        self.calls.borrow_mut().push(command.clone());

        let mut responses = self.responses.borrow_mut();
        let Some(queue) = responses.get_mut(&command) else {
            return Ok(CommandOutput::ok(""));
        };
        let output = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(output.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_returns_stdout() {
        let runner = FakeRunner::new().with_stdout("git branch", "* main\n");
        let out = runner.run("git", &["branch"]).await.unwrap();
        assert_eq!(out, "* main\n");
    }

    #[tokio::test]
    async fn test_run_fails_on_non_zero_exit() {
        let runner = FakeRunner::new().with_failure("git push origin x:x", "rejected");
        let err = runner.run("git", &["push", "origin", "x:x"]).await.unwrap_err();
        match err {
            FlowError::CommandFailed { command, output } => {
                assert_eq!(command, "git push origin x:x");
                assert_eq!(output, "rejected");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_rejects_non_utf8_output() {
        let output = CommandOutput {
            success: true,
            stdout: vec![0xff, 0xfe],
            stderr: Vec::new(),
        };
        let runner = FakeRunner::new().with("git log", output);
        let err = runner.run("git", &["log"]).await.unwrap_err();
        assert!(matches!(err, FlowError::NonUtf8Output { .. }));
    }

    #[tokio::test]
    async fn test_fake_runner_queues_answers() {
        let runner = FakeRunner::new()
            .with_stdout("git branch", "* main\n")
            .with_stdout("git branch", "* feature_x\n");
        assert_eq!(runner.run("git", &["branch"]).await.unwrap(), "* main\n");
        assert_eq!(runner.run("git", &["branch"]).await.unwrap(), "* feature_x\n");
        assert_eq!(runner.run("git", &["branch"]).await.unwrap(), "* feature_x\n");
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_system_runner_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SystemRunner::new(dir.path().to_path_buf());
        let Ok(output) = runner.output("git", &["--version"]).await else {
            // git not installed
            return;
        };
        assert!(output.success);
        assert!(String::from_utf8_lossy(&output.stdout).starts_with("git version"));

        let err = runner.run("git", &["no-such-subcommand"]).await.unwrap_err();
        assert!(matches!(err, FlowError::CommandFailed { .. }));
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput::failed("CONFLICT (content): x\n", "Automatic merge failed\n");
        assert_eq!(
            output.combined(),
            "CONFLICT (content): x\nAutomatic merge failed"
        );
    }
}
