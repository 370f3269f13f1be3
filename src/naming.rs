//! Branch name construction and parsing.
//!
//! A branch is named `family SEP name`, or `family SEP ticket TSEP name` when
//! it carries a ticket id, where `SEP` and `TSEP` are the configured branch
//! and ticket separators.

use std::fmt::Display;

use regex::Regex;

use crate::config::Config;
use crate::error::FlowError;
use crate::error::FlowResult;

/// A branch family, i.e. the leading segment of a branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Family {
    Feature,
    Hotfix,
    Release,
    ReleaseCandidate,
    Stable,
    Custom(String),
}

impl Family {
    pub fn parse(value: &str) -> Self {
        match value {
            "feature" => Self::Feature,
            "hotfix" => Self::Hotfix,
            "release" => Self::Release,
            "releasecandidate" => Self::ReleaseCandidate,
            "stable" => Self::Stable,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Feature => "feature",
            Self::Hotfix => "hotfix",
            Self::Release => "release",
            Self::ReleaseCandidate => "releasecandidate",
            Self::Stable => "stable",
            Self::Custom(name) => name,
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A branch name together with the parts it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName {
    pub name: String,
    pub ticket: Option<String>,
    pub slug: String,
}

impl Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Replace every character outside `[A-Za-z0-9_/-]` with `_`.
///
/// The output has exactly as many characters as the input.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Prepend the configured ticket prefix unless the ticket already contains it.
pub fn normalize_ticket(config: &Config, ticket: &str) -> String {
    if ticket.contains(&config.ticket_prefix) {
        ticket.to_string()
    } else {
        format!("{}{}", config.ticket_prefix, ticket)
    }
}

pub fn build_name(config: &Config, family: &Family, name: &str, ticket: Option<&str>) -> String {
    match ticket {
        Some(ticket) => format!(
            "{family}{}{}{}{name}",
            config.branch_separator,
            normalize_ticket(config, ticket),
            config.ticket_separator
        ),
        None => format!("{family}{}{name}", config.branch_separator),
    }
}

/// Strip `family/` (or `family` plus the branch separator) from a
/// candidate that is already a full branch path.
fn strip_family<'a>(config: &Config, candidate: &'a str, family: &Family) -> Option<&'a str> {
    let rest = candidate.strip_prefix(family.as_str())?;
    rest.strip_prefix('/')
        .or_else(|| rest.strip_prefix(config.branch_separator.as_str()))
}

/// Recognise a ticket embedded in a full branch path such as
/// `feature/ENG-123-fix-bug`.
///
/// Returns the normalized ticket and the trailing slug.
pub fn parse_embedded_ticket(
    config: &Config,
    candidate: &str,
    family: &Family,
) -> Option<(String, String)> {
    let rest = strip_family(config, candidate, family)?;
    let pattern = format!(
        "(?i)^{}(\\d+){}(.+)$",
        regex::escape(&config.ticket_prefix),
        regex::escape(&config.ticket_separator)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(rest)?;
    let digits = caps.get(1)?.as_str();
    let slug = caps.get(2)?.as_str();
    Some((format!("{}{digits}", config.ticket_prefix), slug.to_string()))
}

/// Work out the branch to create for `new`.
///
/// A name that already starts with the family is taken as a full branch
/// path; an embedded ticket in it is re-normalized. Anything else is
/// wrapped with [`build_name`].
pub fn resolve_new_branch(
    config: &Config,
    family: &Family,
    raw_name: &str,
    ticket: Option<&str>,
) -> FlowResult<BranchName> {
    let name = sanitize(raw_name.trim());
    let ticket = ticket
        .map(|t| sanitize(t.trim()))
        .filter(|t| !t.is_empty());

    if name.is_empty() {
        return Err(FlowError::Precondition(format!(
            "a name is required to start a {family}"
        )));
    }

    if let Some((embedded, slug)) = parse_embedded_ticket(config, &name, family) {
        return Ok(BranchName {
            name: build_name(config, family, &slug, Some(&embedded)),
            ticket: Some(embedded),
            slug,
        });
    }

    if let Some(slug) = strip_family(config, &name, family) {
        if config.require_ticket && ticket.is_none() {
            return Err(missing_ticket(family));
        }
        let slug = slug.to_string();
        return Ok(BranchName {
            name,
            ticket: ticket.map(|t| normalize_ticket(config, &t)),
            slug,
        });
    }

    match ticket {
        Some(ticket) => {
            let normalized = normalize_ticket(config, &ticket);
            Ok(BranchName {
                name: build_name(config, family, &name, Some(&normalized)),
                ticket: Some(normalized),
                slug: name,
            })
        }
        None if config.require_ticket => Err(missing_ticket(family)),
        None => Ok(BranchName {
            name: build_name(config, family, &name, None),
            ticket: None,
            slug: name,
        }),
    }
}

/// Work out the branch `finish <name>` refers to.
pub fn resolve_existing_branch(config: &Config, family: &Family, raw_name: &str) -> String {
    let name = sanitize(raw_name.trim());
    if strip_family(config, &name, family).is_some() {
        name
    } else {
        build_name(config, family, &name, None)
    }
}

fn missing_ticket(family: &Family) -> FlowError {
    FlowError::Precondition(format!(
        "a ticket id is required to start a {family}: git {family} new <name> <ticket>"
    ))
}
