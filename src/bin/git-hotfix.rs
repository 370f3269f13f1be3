use std::process::ExitCode;

use gitfeatures::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::run(cli::Entry::Hotfix).await
}
