use branchwatch_core::{Branch, PriorState, Version};

/// Result of diffing one fetch against the prior state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// `name::commit` for every eligible branch, fetch order.
    pub tracked: Vec<String>,
    /// Baseline (if any) followed by one version per new change.
    pub versions: Vec<Version>,
}

/// Accumulates eligible branches and decides which of them are new.
pub struct DiffEngine<'a> {
    prior: &'a PriorState,
    tracked: Vec<String>,
    versions: Vec<Version>,
}

impl<'a> DiffEngine<'a> {
    /// Starts with the prior baseline version when there is one, so the
    /// orchestrator always sees the version it handed in.
    pub fn new(prior: &'a PriorState) -> Self {
        let versions = prior.baseline().cloned().into_iter().collect();
        Self {
            prior,
            tracked: Vec::new(),
            versions,
        }
    }

    /// Record one eligible branch.
    pub fn observe(&mut self, branch: &Branch) {
        self.tracked.push(branch.tracked_token());
        if self.prior.is_unchanged(&branch.name, &branch.latest_commit) {
            return;
        }
        tracing::info!(
            branch = %branch.name,
            commit = %branch.latest_commit,
            "new commit detected"
        );
        self.versions
            .push(Version::new(&branch.name, &branch.latest_commit));
    }

    /// Attach the complete tracked list to every version that has none yet.
    pub fn finish(self) -> Diff {
        let Self {
            tracked,
            mut versions,
            ..
        } = self;
        for version in versions.iter_mut().filter(|v| v.branches.is_empty()) {
            version.branches = tracked.clone();
        }
        Diff { tracked, versions }
    }
}

/// Diff a full sequence of eligible branches.
pub fn diff<'b>(eligible: impl IntoIterator<Item = &'b Branch>, prior: &PriorState) -> Diff {
    let mut engine = DiffEngine::new(prior);
    for branch in eligible {
        engine.observe(branch);
    }
    engine.finish()
}
