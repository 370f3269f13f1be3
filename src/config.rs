use crate::error::FlowError;
use crate::error::FlowResult;
use crate::remote::Provider;

pub const DEFAULT_MAIN_BRANCH: &str = "main";
pub const DEFAULT_BRANCH_SEPARATOR: &str = "_";
pub const DEFAULT_ISSUE_API_URL: &str = "https://api.linear.app/graphql";

/// How `pullrequest` brings a branch up to date with the main branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Merge,
    Rebase,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Rebase => "rebase",
        }
    }
}

/// Process-wide settings, read once at start-up and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub main_branch: String,
    pub branch_separator: String,
    pub ticket_separator: String,
    pub ticket_prefix: String,
    pub provider: Provider,
    pub merge_strategy: MergeStrategy,
    /// Link to the compare view instead of the "new pull request" page.
    pub private_fork_links: bool,
    pub require_ticket: bool,
    pub debug: bool,
    /// Print pull request links instead of opening a browser.
    pub console_only: bool,
    pub github_token: Option<String>,
    pub issue_tracker_token: Option<String>,
    pub issue_tracker_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_branch: DEFAULT_MAIN_BRANCH.to_string(),
            branch_separator: DEFAULT_BRANCH_SEPARATOR.to_string(),
            ticket_separator: DEFAULT_BRANCH_SEPARATOR.to_string(),
            ticket_prefix: String::new(),
            provider: Provider::Github,
            merge_strategy: MergeStrategy::Merge,
            private_fork_links: false,
            require_ticket: false,
            debug: false,
            console_only: false,
            github_token: None,
            issue_tracker_token: None,
            issue_tracker_url: DEFAULT_ISSUE_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from the process environment
    pub fn from_env() -> FlowResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> FlowResult<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let branch_separator =
            get("GITFEATURES_BRANCH_SEPARATOR").unwrap_or(defaults.branch_separator);
        let ticket_separator =
            get("GITFEATURES_TICKET_SEPARATOR").unwrap_or_else(|| branch_separator.clone());

        let merge_strategy = match get("GITFEATURES_STRATEGY").as_deref() {
            None => defaults.merge_strategy,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "merge" => MergeStrategy::Merge,
                "rebase" => MergeStrategy::Rebase,
                other => {
                    return Err(FlowError::Config(format!(
                        "GITFEATURES_STRATEGY must be 'merge' or 'rebase', got '{other}'"
                    )));
                }
            },
        };

        let provider = get("GITFEATURES_REPO")
            .map(|value| Provider::parse(&value))
            .unwrap_or(defaults.provider);

        let private_fork_links = get("GITFEATURES_FORK_PR_STRATEGY")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("private"));

        Ok(Self {
            main_branch: get("GITFEATURES_MAIN_BRANCH").unwrap_or(defaults.main_branch),
            branch_separator,
            ticket_separator,
            ticket_prefix: get("GITFEATURES_TICKET_PREFIX").unwrap_or_default(),
            provider,
            merge_strategy,
            private_fork_links,
            require_ticket: get("GITFEATURES_REQUIRE_TICKET").is_some_and(|v| parse_flag(&v)),
            debug: get("GITFEATURES_DEBUG").is_some_and(|v| parse_flag(&v)),
            console_only: get("GITFEATURES_CONSOLE_ONLY").is_some_and(|v| parse_flag(&v)),
            github_token: get("GITHUB_TOKEN"),
            issue_tracker_token: get("LINEAR_API_KEY"),
            issue_tracker_url: get("GITFEATURES_ISSUE_API_URL")
                .unwrap_or(defaults.issue_tracker_url),
        })
    }

    /// The remote-tracking ref of the main branch, e.g. `origin/main`.
    pub fn origin_main(&self) -> String {
        format!("origin/{}", self.main_branch)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> FlowResult<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.main_branch, "main");
        assert_eq!(config.branch_separator, "_");
        assert_eq!(config.ticket_separator, "_");
        assert_eq!(config.ticket_prefix, "");
        assert_eq!(config.provider, Provider::Github);
        assert_eq!(config.merge_strategy, MergeStrategy::Merge);
        assert!(!config.private_fork_links);
        assert!(!config.require_ticket);
        assert!(!config.debug);
        assert!(config.github_token.is_none());
        assert!(config.issue_tracker_token.is_none());
    }

    #[test]
    fn test_ticket_separator_follows_branch_separator() {
        let config = config_from(&[("GITFEATURES_BRANCH_SEPARATOR", "/")]).unwrap();
        assert_eq!(config.ticket_separator, "/");

        let config = config_from(&[
            ("GITFEATURES_BRANCH_SEPARATOR", "/"),
            ("GITFEATURES_TICKET_SEPARATOR", "-"),
        ])
        .unwrap();
        assert_eq!(config.branch_separator, "/");
        assert_eq!(config.ticket_separator, "-");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GITFEATURES_MAIN_BRANCH", "master"),
            ("GITFEATURES_TICKET_PREFIX", "ENG-"),
            ("GITFEATURES_REPO", "bitbucket"),
            ("GITFEATURES_STRATEGY", "Rebase"),
            ("GITFEATURES_FORK_PR_STRATEGY", "private"),
            ("GITFEATURES_REQUIRE_TICKET", "true"),
            ("GITFEATURES_DEBUG", "1"),
            ("GITFEATURES_CONSOLE_ONLY", "yes"),
            ("GITHUB_TOKEN", "ghp_test"),
        ])
        .unwrap();
        assert_eq!(config.main_branch, "master");
        assert_eq!(config.origin_main(), "origin/master");
        assert_eq!(config.ticket_prefix, "ENG-");
        assert_eq!(config.provider, Provider::Bitbucket);
        assert_eq!(config.merge_strategy, MergeStrategy::Rebase);
        assert!(config.private_fork_links);
        assert!(config.require_ticket);
        assert!(config.debug);
        assert!(config.console_only);
        assert_eq!(config.github_token.as_deref(), Some("ghp_test"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config =
            config_from(&[("GITHUB_TOKEN", ""), ("GITFEATURES_MAIN_BRANCH", " ")]).unwrap();
        assert!(config.github_token.is_none());
        assert_eq!(config.main_branch, "main");
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = config_from(&[("GITFEATURES_STRATEGY", "squash")]).unwrap_err();
        assert!(matches!(err, FlowError::Config(_)));
    }

    #[test]
    fn test_false_flags() {
        let config = config_from(&[("GITFEATURES_REQUIRE_TICKET", "false")]).unwrap();
        assert!(!config.require_ticket);
    }
}
