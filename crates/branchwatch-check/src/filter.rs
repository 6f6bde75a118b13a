use branchwatch_core::{Branch, BranchSource, Result, Source};
use regex::Regex;
use time::OffsetDateTime;

/// Commit message markers that opt a commit out of CI.
pub const SKIP_MARKERS: [&str; 2] = ["[ci skip]", "[skip ci]"];

const SECONDS_PER_DAY: i64 = 86_400;

/// A single exclusion predicate.
#[derive(Debug)]
pub enum Filter {
    /// Keep only branches with an open pull request.
    OpenPullRequest,
    /// Drop branches whose latest commit is older than `days`.
    MaxAge { days: i64 },
    /// Drop branches whose name does not match.
    IncludeName(Regex),
    /// Drop branches whose name matches.
    ExcludeName(Regex),
    /// Drop branches whose latest commit carries a skip marker.
    SkipMarker,
    /// Drop branches whose pull request touches none of the prefixes.
    /// Plain string prefixes: `src` also matches `src2/x`.
    ChangedPaths(Vec<String>),
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::OpenPullRequest => "open_pull_request",
            Filter::MaxAge { .. } => "max_age",
            Filter::IncludeName(_) => "include_name",
            Filter::ExcludeName(_) => "exclude_name",
            Filter::SkipMarker => "skip_marker",
            Filter::ChangedPaths(_) => "changed_paths",
        }
    }

    /// True when this filter removes `branch`.
    pub fn excludes<S: BranchSource + ?Sized>(
        &self,
        branch: &Branch,
        now: OffsetDateTime,
        source: &S,
    ) -> Result<bool> {
        let out = match self {
            Filter::OpenPullRequest => !branch.pull_request.is_open(),
            Filter::MaxAge { days } => branch.latest_commit_ms < cutoff_millis(now, *days),
            Filter::IncludeName(re) => !re.is_match(&branch.name),
            Filter::ExcludeName(re) => re.is_match(&branch.name),
            Filter::SkipMarker => has_skip_marker(&branch.latest_commit_message),
            Filter::ChangedPaths(prefixes) => match branch.pull_request.id {
                Some(id) => {
                    let changed = source.changed_paths(id)?;
                    !changed
                        .iter()
                        .any(|path| prefixes.iter().any(|p| path.starts_with(p.as_str())))
                }
                None => true,
            },
        };
        Ok(out)
    }
}

/// Epoch millis of `now - days`. A cutoff before the earliest representable
/// date is `i64::MIN`, so no commit is old enough to be excluded.
pub fn cutoff_millis(now: OffsetDateTime, days: i64) -> i64 {
    days.checked_mul(SECONDS_PER_DAY)
        .map(time::Duration::seconds)
        .and_then(|age| now.checked_sub(age))
        .map_or(i64::MIN, |cutoff| {
            (cutoff.unix_timestamp_nanos() / 1_000_000) as i64
        })
}

pub fn has_skip_marker(message: &str) -> bool {
    SKIP_MARKERS.iter().any(|m| message.contains(m))
}

/// Ordered filters; the first one that fires excludes the branch.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    /// Validate `source` and build the filters it configures.
    pub fn from_source(source: &Source) -> Result<Self> {
        source.validate()?;

        let mut filters = Vec::new();
        if source.pronly {
            filters.push(Filter::OpenPullRequest);
        }
        if source.days_back > 0 {
            filters.push(Filter::MaxAge {
                days: source.days_back,
            });
        }
        if let Some(re) = source.include_pattern()? {
            filters.push(Filter::IncludeName(re));
        }
        if let Some(re) = source.exclude_pattern()? {
            filters.push(Filter::ExcludeName(re));
        }
        filters.push(Filter::SkipMarker);
        if !source.paths.is_empty() {
            filters.push(Filter::ChangedPaths(source.paths.clone()));
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Run the chain. Stops at the first excluding filter, so changed paths
    /// are only fetched for branches that passed everything else.
    pub fn is_eligible<S: BranchSource + ?Sized>(
        &self,
        branch: &Branch,
        now: OffsetDateTime,
        source: &S,
    ) -> Result<bool> {
        for filter in &self.filters {
            if filter.excludes(branch, now, source)? {
                tracing::debug!(
                    branch = %branch.name,
                    filter = filter.name(),
                    "branch filtered out"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{BTreeSet, HashMap};

    use branchwatch_core::{Error, PullRequestState, PullRequestSummary};

    use super::*;

    /// Serves changed paths per pull request id and counts lookups.
    #[derive(Default)]
    struct PathSource {
        paths: HashMap<u64, Vec<&'static str>>,
        lookups: RefCell<Vec<u64>>,
    }

    impl BranchSource for PathSource {
        fn fetch_branches(&self) -> Result<Vec<Branch>> {
            Ok(vec![])
        }

        fn changed_paths(&self, pull_request_id: u64) -> Result<BTreeSet<String>> {
            self.lookups.borrow_mut().push(pull_request_id);
            Ok(self
                .paths
                .get(&pull_request_id)
                .map(|ps| ps.iter().map(|p| p.to_string()).collect())
                .unwrap_or_default())
        }
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn days_ago(now: OffsetDateTime, days: i64) -> i64 {
        ((now - time::Duration::days(days)).unix_timestamp_nanos() / 1_000_000) as i64
    }

    fn branch_fixture(now: OffsetDateTime) -> Branch {
        Branch {
            name: "feature/my-branch".into(),
            latest_commit: "my-latest-commit-sha".into(),
            latest_commit_ms: days_ago(now, 2),
            latest_commit_message: "my commit message".into(),
            pull_request: PullRequestSummary {
                state: PullRequestState::Open,
                open_count: 1,
                id: Some(7),
            },
        }
    }

    fn source_fixture() -> Source {
        Source {
            pronly: true,
            days_back: 0,
            ..Default::default()
        }
    }

    fn eligible(source: &Source, branch: &Branch, now: OffsetDateTime) -> bool {
        FilterChain::from_source(source)
            .unwrap()
            .is_eligible(branch, now, &PathSource::default())
            .unwrap()
    }

    #[test]
    fn no_filters_keeps_branch() {
        let now = now();
        assert!(eligible(&source_fixture(), &branch_fixture(now), now));
    }

    #[test]
    fn pronly_excludes_branch_without_open_pr() {
        let now = now();
        let mut branch = branch_fixture(now);
        branch.pull_request = PullRequestSummary {
            state: PullRequestState::Other,
            open_count: 0,
            id: Some(7),
        };
        assert!(!eligible(&source_fixture(), &branch, now));

        branch.pull_request = PullRequestSummary::default();
        assert!(!eligible(&source_fixture(), &branch, now));
    }

    #[test]
    fn pronly_keeps_branch_with_open_count_only() {
        let now = now();
        let mut branch = branch_fixture(now);
        branch.pull_request.state = PullRequestState::Absent;
        branch.pull_request.open_count = 1;
        assert!(eligible(&source_fixture(), &branch, now));
    }

    #[test]
    fn without_pronly_branch_without_pr_is_kept() {
        let now = now();
        let mut branch = branch_fixture(now);
        branch.pull_request = PullRequestSummary::default();
        assert!(eligible(&Source::default(), &branch, now));
    }

    #[test]
    fn age_filter_excludes_old_commit() {
        let now = now();
        let mut source = source_fixture();
        source.days_back = 1;
        assert!(!eligible(&source, &branch_fixture(now), now));
    }

    #[test]
    fn age_filter_keeps_recent_commit() {
        let now = now();
        let mut source = source_fixture();
        source.days_back = 3;
        assert!(eligible(&source, &branch_fixture(now), now));
    }

    #[test]
    fn age_filter_boundary_is_kept() {
        let now = now();
        let mut source = source_fixture();
        source.days_back = 2;
        let mut branch = branch_fixture(now);
        branch.latest_commit_ms = cutoff_millis(now, 2);
        assert!(eligible(&source, &branch, now));

        branch.latest_commit_ms -= 1;
        assert!(!eligible(&source, &branch, now));
    }

    #[test]
    fn age_filter_beyond_date_range_keeps_everything() {
        let now = now();
        let mut source = source_fixture();
        source.days_back = 5_000_000;
        let mut branch = branch_fixture(now);
        branch.latest_commit_ms = 0;
        assert!(eligible(&source, &branch, now));
        assert_eq!(cutoff_millis(now, i64::MAX), i64::MIN);
    }

    #[test]
    fn non_positive_age_builds_no_age_filter() {
        let now = now();
        for days in [0, -1] {
            let mut source = source_fixture();
            source.days_back = days;
            let chain = FilterChain::from_source(&source).unwrap();
            assert!(!chain
                .filters()
                .iter()
                .any(|f| matches!(f, Filter::MaxAge { .. })));
            let mut branch = branch_fixture(now);
            branch.latest_commit_ms = 0;
            assert!(eligible(&source, &branch, now));
        }
    }

    #[test]
    fn include_pattern() {
        let now = now();
        let mut source = source_fixture();
        source.branches = "feature/my-branch".into();
        assert!(eligible(&source, &branch_fixture(now), now));

        source.branches = "feature/my-branch1".into();
        assert!(!eligible(&source, &branch_fixture(now), now));
    }

    #[test]
    fn exclude_pattern() {
        let now = now();
        let mut source = source_fixture();
        source.ignore_branches = "feature/my-branch".into();
        assert!(!eligible(&source, &branch_fixture(now), now));

        source.ignore_branches = "feature/my-branch1".into();
        assert!(eligible(&source, &branch_fixture(now), now));
    }

    #[test]
    fn skip_markers_exclude_regardless_of_other_filters() {
        let now = now();
        for message in [
            "fix typo [ci skip]",
            "[skip ci] bump version",
            "docs only[ci skip]trailing",
        ] {
            let mut branch = branch_fixture(now);
            branch.latest_commit_message = message.into();
            assert!(!eligible(&source_fixture(), &branch, now), "{message}");
        }
    }

    #[test]
    fn skip_marker_is_case_sensitive() {
        assert!(!has_skip_marker("[CI SKIP] shouting"));
        assert!(!has_skip_marker("skip ci"));
        assert!(has_skip_marker("x [skip ci]"));
    }

    #[test]
    fn paths_filter_excludes_when_no_prefix_matches() {
        let now = now();
        let mut source = source_fixture();
        source.paths = vec!["src".into()];
        let lookup = PathSource {
            paths: HashMap::from([(7, vec!["docs/readme.md"])]),
            ..Default::default()
        };
        let chain = FilterChain::from_source(&source).unwrap();
        assert!(!chain.is_eligible(&branch_fixture(now), now, &lookup).unwrap());
        assert_eq!(*lookup.lookups.borrow(), vec![7]);
    }

    #[test]
    fn paths_filter_keeps_on_any_prefix_match() {
        let now = now();
        let mut source = source_fixture();
        source.paths = vec!["api".into(), "src".into()];
        let lookup = PathSource {
            paths: HashMap::from([(7, vec!["docs/readme.md", "src/lib.rs"])]),
            ..Default::default()
        };
        let chain = FilterChain::from_source(&source).unwrap();
        assert!(chain.is_eligible(&branch_fixture(now), now, &lookup).unwrap());
    }

    #[test]
    fn paths_filter_is_plain_prefix_match() {
        let now = now();
        let mut source = source_fixture();
        source.paths = vec!["src".into()];
        let lookup = PathSource {
            paths: HashMap::from([(7, vec!["src2/other.rs"])]),
            ..Default::default()
        };
        let chain = FilterChain::from_source(&source).unwrap();
        assert!(chain.is_eligible(&branch_fixture(now), now, &lookup).unwrap());
    }

    #[test]
    fn paths_not_fetched_for_branch_excluded_earlier() {
        let now = now();
        let mut source = source_fixture();
        source.paths = vec!["src".into()];
        source.ignore_branches = "^feature/".into();
        let lookup = PathSource::default();
        let chain = FilterChain::from_source(&source).unwrap();
        assert!(!chain.is_eligible(&branch_fixture(now), now, &lookup).unwrap());
        assert!(lookup.lookups.borrow().is_empty());
    }

    #[test]
    fn paths_filter_without_pr_id_excludes_without_fetch() {
        let now = now();
        let mut source = source_fixture();
        source.paths = vec!["src".into()];
        let mut branch = branch_fixture(now);
        branch.pull_request.id = None;
        let lookup = PathSource::default();
        let chain = FilterChain::from_source(&source).unwrap();
        assert!(!chain.is_eligible(&branch, now, &lookup).unwrap());
        assert!(lookup.lookups.borrow().is_empty());
    }

    #[test]
    fn chain_order_follows_configuration() {
        let source = Source {
            pronly: true,
            days_back: 5,
            branches: "^feature/".into(),
            ignore_branches: "wip".into(),
            paths: vec!["src".into()],
            ..Default::default()
        };
        let chain = FilterChain::from_source(&source).unwrap();
        let names: Vec<&str> = chain.filters().iter().map(Filter::name).collect();
        assert_eq!(
            names,
            vec![
                "open_pull_request",
                "max_age",
                "include_name",
                "exclude_name",
                "skip_marker",
                "changed_paths"
            ]
        );
    }

    #[test]
    fn invalid_configuration_rejected() {
        let source = Source {
            paths: vec!["src".into()],
            pronly: false,
            ..Default::default()
        };
        assert!(matches!(
            FilterChain::from_source(&source),
            Err(Error::Configuration(_))
        ));
    }
}
