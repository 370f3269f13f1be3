use crate::App;
use crate::app::MAX_DATED_BRANCHES;
use crate::clients::http::HttpClient;
use crate::clients::runner::CommandRunner;
use crate::error::FlowResult;
use crate::naming;
use crate::naming::Family;
use crate::prompt::Prompter;

/// What `rotate` should do with a dated family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Cut a new dated branch, optionally labelled.
    New(Option<String>),
    /// Switch to the most recent dated branch.
    Latest,
}

impl<R: CommandRunner, H: HttpClient, P: Prompter> App<R, H, P> {
    /// Manage a family of dated branches such as `stable_20240301_0930`.
    ///
    /// `New` cuts a branch named after today's date and a label (the time of
    /// day when none is given), pushes it, then offers to delete the oldest
    /// branch once more than [`MAX_DATED_BRANCHES`] exist. `Latest` checks out
    /// the newest one.
    pub async fn cmd_rotate(
        &self,
        family: &Family,
        rotation: &Rotation,
        stdout: &mut impl std::io::Write,
    ) -> FlowResult<()> {
        let separator = &self.config.branch_separator;
        match rotation {
            Rotation::New(label) => {
                let label = match label.as_deref().map(str::trim) {
                    Some(label) if !label.is_empty() => naming::sanitize(label),
                    _ => self.now.format("%H%M").to_string(),
                };
                let dated = format!("{}_{label}", self.now.format("%Y%m%d"));
                let branch = naming::build_name(&self.config, family, &dated, None);

                self.git.create_branch(&branch).await?;
                self.git.push_upstream(&branch).await?;
                writeln!(stdout, "Created {branch} and pushed it to origin")?;

                let branches = self
                    .git
                    .list_family_branches(family.as_str(), separator)
                    .await?;
                if branches.len() > MAX_DATED_BRANCHES
                    && let Some(oldest) = branches.first()
                {
                    writeln!(
                        stdout,
                        "You have {} {family} branches, more than {MAX_DATED_BRANCHES}.",
                        branches.len()
                    )?;
                    if self
                        .prompter
                        .confirm(&format!("Delete the oldest one, {oldest}?"))?
                    {
                        self.git.delete_remote_branch(oldest).await?;
                        // Branches cut elsewhere may never have been checked out here
                        if self.git.local_branch_exists(oldest).await? {
                            self.git.delete_local_branch(oldest).await?;
                        }
                        writeln!(stdout, "Deleted {oldest}")?;
                    }
                }
            }
            Rotation::Latest => {
                let branches = self
                    .git
                    .list_family_branches(family.as_str(), separator)
                    .await?;
                match branches.last() {
                    Some(latest) => {
                        self.git.checkout(latest).await?;
                        writeln!(stdout, "Switched to {latest}")?;
                    }
                    None => writeln!(stdout, "No {family} branches")?,
                }
            }
        }

        Ok(())
    }
}
