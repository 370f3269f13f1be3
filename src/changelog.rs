//! Per-branch changelog files under `changelog/`.
//!
//! Writing a changelog is a best-effort side task of `new`: every failure is
//! an [`EnrichError`] the caller logs and drops.

use std::path::Path;
use std::path::PathBuf;

use minijinja::Environment;
use serde::Serialize;

use crate::clients::issues::Issue;
use crate::error::EnrichError;

pub const CHANGELOG_DIR: &str = "changelog";
pub const TEMPLATE_FILE: &str = "template.md";

pub const DEFAULT_TEMPLATE: &str = "\
# {{ branch }}
{% if issue %}
[{{ issue.identifier }}: {{ issue.title }}]({{ issue.url }})
{% if issue.description %}
{{ issue.description }}
{% endif %}{% elif ticket %}
Ticket: {{ ticket }}
{% endif %}
Started {{ date }}.

## Changes

- {{ name }}
";

/// Everything a changelog template can refer to.
#[derive(Debug, Clone, Serialize)]
pub struct ChangelogContext {
    pub branch: String,
    pub family: String,
    pub name: String,
    pub ticket: Option<String>,
    pub date: String,
    pub issue: Option<Issue>,
}

/// `changelog/<branch>.md`; slashes in the branch become directories.
pub fn changelog_path(root: &Path, branch: &str) -> PathBuf {
    root.join(CHANGELOG_DIR).join(format!("{branch}.md"))
}

/// Whether the repository keeps changelogs at all.
pub async fn enabled(root: &Path) -> bool {
    tokio::fs::metadata(root.join(CHANGELOG_DIR))
        .await
        .is_ok_and(|meta| meta.is_dir())
}

/// The repository's own template if it has one, else [`DEFAULT_TEMPLATE`].
pub async fn load_template(root: &Path) -> String {
    tokio::fs::read_to_string(root.join(CHANGELOG_DIR).join(TEMPLATE_FILE))
        .await
        .unwrap_or_else(|_| DEFAULT_TEMPLATE.to_string())
}

pub fn render(template: &str, context: &ChangelogContext) -> Result<String, EnrichError> {
    let env = Environment::new();
    Ok(env.render_str(template, context)?)
}

/// Write a rendered changelog, creating intermediate directories.
pub async fn write(root: &Path, branch: &str, contents: &str) -> Result<PathBuf, EnrichError> {
    let path = changelog_path(root, branch);
    let write_err = |source| EnrichError::Write {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(&path, contents).await.map_err(write_err)?;
    Ok(path)
}

/// Contents of the branch's changelog, if it has one.
pub async fn read(root: &Path, branch: &str) -> Option<String> {
    tokio::fs::read_to_string(changelog_path(root, branch))
        .await
        .ok()
        .filter(|contents| !contents.trim().is_empty())
}
