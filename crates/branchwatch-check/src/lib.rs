pub mod diff;
pub mod filter;

use branchwatch_core::{BranchSource, PriorState, Result, Source, Version};
use time::OffsetDateTime;

pub use diff::{diff, Diff, DiffEngine};
pub use filter::{Filter, FilterChain};

/// One `check` run: validate, fetch, filter, diff.
///
/// Configuration and prior state are validated before the first request, and
/// any error aborts the run without a partial result.
pub fn run_check<S: BranchSource + ?Sized>(
    config: &Source,
    version: &Version,
    source: &S,
    now: OffsetDateTime,
) -> Result<Vec<Version>> {
    let chain = FilterChain::from_source(config)?;
    let prior = PriorState::from_version(version)?;

    let branches = source.fetch_branches()?;
    let mut engine = DiffEngine::new(&prior);
    for branch in &branches {
        if chain.is_eligible(branch, now, source)? {
            engine.observe(branch);
        }
    }
    let Diff { tracked, versions } = engine.finish();

    tracing::info!(
        previously_tracked = prior.len(),
        fetched = branches.len(),
        tracked = tracked.len(),
        versions = versions.len(),
        "check complete"
    );
    Ok(versions)
}
