use std::time::Duration;

use anyhow::Context;
use branchwatch_core::{BranchSource, ResourceInput};
use branchwatch_stash::{StashClient, UreqTransport};
use time::OffsetDateTime;

/// `branchwatch check`
pub fn execute(input: &ResourceInput, timeout: Duration) -> anyhow::Result<String> {
    tracing::debug!(source = ?input.source, "check");
    let client = StashClient::new(&input.source, UreqTransport::new(timeout))
        .context("configuring stash client")?;
    render(input, &client, OffsetDateTime::now_utc())
}

/// Run the check and serialize the versions as a JSON array.
fn render<S: BranchSource>(
    input: &ResourceInput,
    source: &S,
    now: OffsetDateTime,
) -> anyhow::Result<String> {
    let versions =
        branchwatch_check::run_check(&input.source, &input.version_or_default(), source, now)
            .context("checking for new branches")?;
    Ok(serde_json::to_string(&versions)?)
}
