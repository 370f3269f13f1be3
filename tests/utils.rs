use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Whether a `git` binary is on the PATH.
pub async fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|status| status.success())
}

/// Runs git in `dir` and returns its trimmed stdout.
pub async fn git(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .await?;
    anyhow::ensure!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Creates a working repository at `dir/work` whose `origin` is a bare
/// repository at `dir/origin.git`, with one commit on `main` pushed.
///
/// Returns the working repository's path.
pub async fn create_repo_with_remote(dir: &Path) -> anyhow::Result<std::path::PathBuf> {
    let origin = dir.join("origin.git");
    let work = dir.join("work");
    tokio::fs::create_dir_all(&origin).await?;
    tokio::fs::create_dir_all(&work).await?;

    git(&origin, &["init", "--bare", "-b", "main"]).await?;

    git(&work, &["init", "-b", "main"]).await?;
    git(&work, &["config", "user.name", "Test User"]).await?;
    git(&work, &["config", "user.email", "test@example.com"]).await?;
    let origin_url = origin.to_string_lossy();
    git(&work, &["remote", "add", "origin", &origin_url]).await?;

    commit_file(&work, "README.md", "hello\n", "Initial commit").await?;
    git(&work, &["push", "-u", "origin", "main"]).await?;

    Ok(work)
}

/// Writes a file and commits it on the current branch.
pub async fn commit_file(
    dir: &Path,
    filename: &str,
    contents: &str,
    message: &str,
) -> anyhow::Result<()> {
    tokio::fs::write(dir.join(filename), contents).await?;
    git(dir, &["add", filename]).await?;
    git(dir, &["commit", "-m", message]).await?;
    Ok(())
}

/// Branch names on origin, sorted.
pub async fn remote_branches(dir: &Path) -> anyhow::Result<Vec<String>> {
    let listing = git(dir, &["ls-remote", "--heads", "origin"]).await?;
    let mut branches: Vec<String> = listing
        .lines()
        .filter_map(|line| line.split_once("refs/heads/"))
        .map(|(_, branch)| branch.to_string())
        .collect();
    branches.sort();
    Ok(branches)
}

pub fn setup_logging() -> anyhow::Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let format = tracing_subscriber::fmt::format().with_timer(timer);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let subscriber = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .event_format(format)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(filter);
    tracing_subscriber::registry().with(subscriber).try_init()?;
    Ok(())
}

pub enum TestDir {
    Temp(tempfile::TempDir),
    Kept(std::path::PathBuf),
}

impl TestDir {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;

        if std::env::var("DEBUG_TESTS").is_ok() {
            let path = temp_dir.keep();
            eprintln!("Test directory kept at: {}", path.display());
            Ok(TestDir::Kept(path))
        } else {
            Ok(TestDir::Temp(temp_dir))
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            TestDir::Temp(t) => t.path(),
            TestDir::Kept(p) => p.as_path(),
        }
    }
}
