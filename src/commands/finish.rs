use crate::App;
use crate::clients::http::HttpClient;
use crate::clients::runner::CommandRunner;
use crate::error::FlowError;
use crate::error::FlowResult;
use crate::naming;
use crate::naming::Family;
use crate::prompt::Prompter;

impl<R: CommandRunner, H: HttpClient, P: Prompter> App<R, H, P> {
    /// Retire a branch once everything on it has reached the main branch.
    ///
    /// Without a name the current branch is finished, which is only allowed
    /// off the main branch. A branch is deleted (remote first, then local)
    /// only when `git log <branch> ^origin/<main>` is empty.
    pub async fn cmd_finish(
        &self,
        family: &Family,
        name: Option<&str>,
        stdout: &mut impl std::io::Write,
    ) -> FlowResult<()> {
        let main = &self.config.main_branch;
        let current = self.git.current_branch().await?;

        let branch = match name {
            Some(name) => {
                let branch = naming::resolve_existing_branch(&self.config, family, name);
                if branch == current {
                    self.git.checkout(main).await?;
                }
                branch
            }
            None if &current != main => {
                self.git.checkout(main).await?;
                current
            }
            None => {
                return Err(FlowError::Precondition(format!(
                    "please provide a branch name when on {main}: git {family} finish <name>"
                )));
            }
        };

        self.git.remote_update().await?;

        let origin_main = self.config.origin_main();
        let commits = self.git.commits_not_in(&branch, &origin_main).await?;
        if !commits.is_empty() {
            return Err(FlowError::UnmergedCommits {
                branch,
                main: origin_main,
                commits,
            });
        }

        self.git.delete_remote_branch(&branch).await?;
        self.git.delete_local_branch(&branch).await?;
        writeln!(stdout, "Deleted {branch} locally and on origin")?;

        Ok(())
    }
}
