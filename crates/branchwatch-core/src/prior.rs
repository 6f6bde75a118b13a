use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::split_tracked_token;
use crate::version::Version;

/// What the previous run observed, rebuilt from the input version.
#[derive(Debug, Clone, Default)]
pub struct PriorState {
    commits: HashMap<String, String>,
    baseline: Option<Version>,
}

impl PriorState {
    /// Parse the tracked tokens of `version`. The version itself becomes the
    /// baseline when it carries any tracked branches.
    pub fn from_version(version: &Version) -> Result<Self> {
        let mut commits = HashMap::with_capacity(version.branches.len());
        for token in &version.branches {
            let (name, commit) = split_tracked_token(token).ok_or_else(|| {
                Error::decode(
                    "tracked branch token",
                    format!("{token:?} has no '::' separator"),
                )
            })?;
            commits.insert(name.to_string(), commit.to_string());
        }
        let baseline = (!version.branches.is_empty()).then(|| version.clone());
        Ok(Self { commits, baseline })
    }

    /// Commit last seen for `branch`, if any.
    pub fn commit_of(&self, branch: &str) -> Option<&str> {
        self.commits.get(branch).map(String::as_str)
    }

    /// True when `branch` was last seen at exactly `commit`.
    pub fn is_unchanged(&self, branch: &str, commit: &str) -> bool {
        self.commit_of(branch) == Some(commit)
    }

    pub fn baseline(&self) -> Option<&Version> {
        self.baseline.as_ref()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_version_has_no_baseline() {
        let prior = PriorState::from_version(&Version::default()).unwrap();
        assert!(prior.is_empty());
        assert!(prior.baseline().is_none());
    }

    #[test]
    fn parses_tokens_into_map() {
        let mut v = Version::new("feature/a", "sha-a");
        v.branches = vec!["feature/a::sha-a".into(), "feature/b::sha-b".into()];
        let prior = PriorState::from_version(&v).unwrap();

        assert_eq!(prior.len(), 2);
        assert_eq!(prior.commit_of("feature/b"), Some("sha-b"));
        assert!(prior.is_unchanged("feature/a", "sha-a"));
        assert!(!prior.is_unchanged("feature/a", "sha-new"));
        assert!(!prior.is_unchanged("feature/c", "sha-a"));
        assert_eq!(prior.baseline(), Some(&v));
    }

    #[test]
    fn malformed_token_is_decode_error() {
        let mut v = Version::default();
        v.branches = vec!["feature/a-sha-a".into()];
        let err = PriorState::from_version(&v).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
