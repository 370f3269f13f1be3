mod app;
pub mod changelog;
pub mod cli;
pub mod clients;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod prompt;
pub mod remote;

pub use app::App;
pub use app::MAX_DATED_BRANCHES;
pub use config::Config;

// Disable colors for all tests to get clean output
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
