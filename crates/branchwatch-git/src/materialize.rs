use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use branchwatch_core::{Source, Version};

use crate::error::{MaterializeError, Result};
use crate::runner::{CommandRunner, CommandSpec};
use crate::ssh::SshSetup;

/// Author email of the fetched commit.
pub const COMMITTER_FILE: &str = "committer";
/// Full message of the fetched commit.
pub const COMMIT_MESSAGE_FILE: &str = "commit_message";

const BRANCH_NAME_KEY: &str = "concourse-ci.branch-name";
const PRS_LIST_KEY: &str = "concourse-ci.prs-list";

/// Turns a version into a working copy at a destination directory.
pub struct Materializer<R: CommandRunner> {
    runner: R,
    ssh: Option<SshSetup>,
}

impl<R: CommandRunner> Materializer<R> {
    /// `ssh` is only used when the source carries a private key.
    pub fn new(runner: R, ssh: Option<SshSetup>) -> Self {
        Self { runner, ssh }
    }

    /// Clone the changed branch, check out its ref, record branch metadata in
    /// the git config and write the committer and commit message files.
    pub fn fetch(&self, source: &Source, version: &Version, dest: &Path) -> Result<()> {
        if source.repo_url.is_empty() {
            return Err(MaterializeError::Invalid("source.repo is required".into()));
        }
        if version.changed_branch.is_empty() || version.git_ref.is_empty() {
            return Err(MaterializeError::Invalid(
                "version must carry changed_branch and ref".into(),
            ));
        }

        let env = self.agent_env(source)?;
        let dest_str = dest.to_string_lossy().to_string();
        let git = |args: &[&str]| CommandSpec::git(args.iter().copied()).envs(&env);

        tracing::info!(
            branch = %version.changed_branch,
            git_ref = %version.git_ref,
            dest = %dest.display(),
            "cloning"
        );
        self.runner.run(&git(&[
            "clone",
            "--single-branch",
            source.repo_url.as_str(),
            "--branch",
            version.changed_branch.as_str(),
            dest_str.as_str(),
        ]))?;
        self.runner
            .run(&git(&["checkout", "-q", version.git_ref.as_str()]).cwd(dest))?;
        self.runner.run(
            &git(&["submodule", "update", "--init", "--depth", "1", "--recursive"]).cwd(dest),
        )?;
        self.runner.run(
            &git(&["config", BRANCH_NAME_KEY, version.changed_branch.as_str()]).cwd(dest),
        )?;
        let prs_list = version.branches.join(",");
        self.runner
            .run(&git(&["config", PRS_LIST_KEY, prs_list.as_str()]).cwd(dest))?;

        let committer = self
            .runner
            .run(&git(&["--no-pager", "log", "-1", "--pretty=format:%ae"]).cwd(dest))?;
        write_file(&dest.join(COMMITTER_FILE), &committer)?;
        let message = self
            .runner
            .run(&git(&["log", "-1", "--format=format:%B"]).cwd(dest))?;
        write_file(&dest.join(COMMIT_MESSAGE_FILE), &message)?;

        Ok(())
    }

    fn agent_env(&self, source: &Source) -> Result<BTreeMap<String, String>> {
        if source.private_key.is_empty() {
            tracing::debug!("no private key configured, using ambient ssh setup");
            return Ok(BTreeMap::new());
        }
        match &self.ssh {
            Some(ssh) => ssh.install(&source.private_key, &self.runner),
            None => Err(MaterializeError::Invalid(
                "private_key given but no ssh setup available".into(),
            )),
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| MaterializeError::io(path, e))
}
