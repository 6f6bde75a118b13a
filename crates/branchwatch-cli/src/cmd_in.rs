use std::path::Path;

use anyhow::Context;
use branchwatch_core::ResourceInput;
use branchwatch_git::{CommandRunner, Materializer, SshSetup, SystemRunner};

/// `branchwatch in <dest>`
pub fn execute(input: &ResourceInput, dest: &Path) -> anyhow::Result<String> {
    let ssh = if input.source.private_key.is_empty() {
        None
    } else {
        Some(SshSetup::from_env().context("preparing ssh key setup")?)
    };
    tracing::debug!(source = ?input.source, dest = %dest.display(), "in");
    render(input, dest, &Materializer::new(SystemRunner, ssh))
}

/// Materialize the input version and echo it back as `{"version": ...}`.
fn render<R: CommandRunner>(
    input: &ResourceInput,
    dest: &Path,
    materializer: &Materializer<R>,
) -> anyhow::Result<String> {
    let version = input.version_or_default();
    materializer
        .fetch(&input.source, &version, dest)
        .with_context(|| {
            format!(
                "fetching {} at {} into {}",
                version.changed_branch,
                version.git_ref,
                dest.display()
            )
        })?;
    Ok(serde_json::json!({ "version": version }).to_string())
}
