use log::warn;

use crate::App;
use crate::clients::http::HttpClient;
use crate::clients::runner::CommandRunner;
use crate::error::FlowError;
use crate::error::FlowResult;
use crate::naming;
use crate::naming::Family;
use crate::prompt::Prompter;

impl<R: CommandRunner, H: HttpClient, P: Prompter> App<R, H, P> {
    /// Start a new branch of `family`.
    ///
    /// 1. Confirm when not starting from the main branch.
    /// 2. Work out the branch name, re-normalizing an embedded ticket.
    /// 3. Refuse names that already exist locally or on origin.
    /// 4. Create the branch, switch to it and push it with tracking.
    /// 5. Best effort: write `changelog/<branch>.md`.
    pub async fn cmd_start(
        &self,
        family: &Family,
        raw_name: &str,
        ticket: Option<&str>,
        stdout: &mut impl std::io::Write,
    ) -> FlowResult<()> {
        let main = &self.config.main_branch;
        let current = self.git.current_branch().await?;
        if &current != main {
            writeln!(stdout, "You are on {current}, not {main}.")?;
            self.confirm_or_abort(
                &format!("Start a new {family} from {current}?"),
                format!("{family}s are started from {main}"),
            )?;
        }

        self.git.remote_update().await?;
        let branch = naming::resolve_new_branch(&self.config, family, raw_name, ticket)?;

        if self.git.branch_exists(&branch.name).await? {
            return Err(FlowError::Precondition(format!(
                "local or remote branch already exists: {branch}"
            )));
        }

        self.git.create_branch(&branch.name).await?;
        self.git.push_upstream(&branch.name).await?;
        writeln!(stdout, "Created {branch} and pushed it to origin")?;

        match self.write_changelog(family, &branch).await {
            Ok(Some(path)) => writeln!(stdout, "Wrote changelog {}", path.display())?,
            Ok(None) => {}
            Err(err) => warn!("Skipping changelog for {branch}: {err}"),
        }

        Ok(())
    }
}
