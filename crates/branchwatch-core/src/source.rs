use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Branch;
use crate::version::Version;

/// The `source` block of the resource configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Server host, optionally with an `http://` or `https://` scheme.
    pub stash_url: String,
    pub project_name: String,
    pub repo_name: String,
    pub username: String,
    pub password: String,
    /// Only track branches with an open pull request.
    pub pronly: bool,
    /// Ignore branches whose latest commit is older than this many days.
    /// Zero or negative = no limit.
    pub days_back: i64,
    /// Include regex for branch names. Empty = all.
    pub branches: String,
    /// Exclude regex for branch names. Empty = none.
    pub ignore_branches: String,
    /// Required changed-path prefixes. Only valid together with `pronly`.
    pub paths: Vec<String>,
    /// Clone URL used by `in`.
    #[serde(rename = "repo")]
    pub repo_url: String,
    /// SSH private key used by `in`.
    pub private_key: String,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("stash_url", &self.stash_url)
            .field("project_name", &self.project_name)
            .field("repo_name", &self.repo_name)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("pronly", &self.pronly)
            .field("days_back", &self.days_back)
            .field("branches", &self.branches)
            .field("ignore_branches", &self.ignore_branches)
            .field("paths", &self.paths)
            .field("repo_url", &self.repo_url)
            .field("private_key", &redacted(&self.private_key))
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}

impl Source {
    /// Check the filter settings. Runs before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        if !self.pronly && !self.paths.is_empty() {
            return Err(Error::Configuration(
                "cannot pass paths when pronly is false".to_string(),
            ));
        }
        self.include_pattern()?;
        self.exclude_pattern()?;
        Ok(())
    }

    /// Check that the server coordinates needed for REST calls are present.
    pub fn require_server(&self) -> Result<()> {
        for (key, value) in [
            ("stash_url", &self.stash_url),
            ("project_name", &self.project_name),
            ("repo_name", &self.repo_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{key} is required")));
            }
        }
        Ok(())
    }

    /// Server base URL without trailing slash; `https://` unless a scheme is given.
    pub fn base_url(&self) -> String {
        let host = self.stash_url.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }

    pub fn include_pattern(&self) -> Result<Option<Regex>> {
        compile_pattern("branches", &self.branches)
    }

    pub fn exclude_pattern(&self) -> Result<Option<Regex>> {
        compile_pattern("ignore_branches", &self.ignore_branches)
    }
}

fn compile_pattern(key: &str, pattern: &str) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| Error::Configuration(format!("{key} is not a valid regex: {e}")))
}

/// Whole stdin document handed over by the orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceInput {
    #[serde(default)]
    pub source: Source,
    /// Absent or `null` on the very first check.
    #[serde(default)]
    pub version: Option<Version>,
}

impl ResourceInput {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::decode("resource input", e))
    }

    /// The input version, or the empty version when none was supplied.
    pub fn version_or_default(&self) -> Version {
        self.version.clone().unwrap_or_default()
    }
}

/// Read-only access to branch metadata on the server.
pub trait BranchSource {
    /// All branches of the configured repository, server order.
    fn fetch_branches(&self) -> Result<Vec<Branch>>;

    /// Paths touched by a pull request, `parent/name` joined.
    fn changed_paths(&self, pull_request_id: u64) -> Result<BTreeSet<String>>;
}
