//! Integration layers for the external systems `gitfeatures` drives.
//!
//! - [`runner`]: running external programs (the command executor)
//! - [`git`]: every git invocation the workflows issue, plus branch queries
//! - [`http`]: curl-based HTTP client for the REST and GraphQL APIs
//! - [`github`]: pull request creation through the GitHub API
//! - [`issues`]: issue lookup for changelog enrichment
//!
//! Process and network access sit behind the [`runner::CommandRunner`] and
//! [`http::HttpClient`] traits so the workflows can be tested with fakes.

pub mod git;
pub mod github;
pub mod http;
pub mod issues;
pub mod runner;
