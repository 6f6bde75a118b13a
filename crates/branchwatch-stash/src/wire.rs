//! Response shapes of the Bitbucket Server REST API. The vendor metadata keys
//! stay in this module; everything else works on [`branchwatch_core::Branch`].

use std::collections::BTreeSet;

use branchwatch_core::{Branch, PullRequestState, PullRequestSummary};
use serde::Deserialize;

// ── Branches ──

#[derive(Debug, Deserialize)]
pub struct BranchPage {
    #[serde(default)]
    pub values: Vec<WireBranch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBranch {
    pub display_id: String,
    pub latest_commit: String,
    #[serde(default)]
    pub metadata: WireMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireMetadata {
    #[serde(rename = "com.atlassian.bitbucket.server.bitbucket-branch:latest-commit-metadata", default)]
    pub latest_commit: WireLatestCommit,
    #[serde(
        rename = "com.atlassian.bitbucket.server.bitbucket-ref-metadata:outgoing-pull-request-metadata",
        default
    )]
    pub outgoing_pull_request: Option<WirePullRequestMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireLatestCommit {
    #[serde(rename = "authorTimestamp", default)]
    pub author_timestamp: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePullRequestMetadata {
    #[serde(default)]
    pub pull_request: Option<WirePullRequest>,
    #[serde(default)]
    pub open: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct WirePullRequest {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub id: u64,
}

impl From<WireBranch> for Branch {
    fn from(wire: WireBranch) -> Self {
        let pull_request = match wire.metadata.outgoing_pull_request {
            Some(md) => {
                let (state, id) = match md.pull_request {
                    Some(pr) => (PullRequestState::from_wire(&pr.state), Some(pr.id)),
                    None => (PullRequestState::Absent, None),
                };
                PullRequestSummary {
                    state,
                    open_count: md.open,
                    id,
                }
            }
            None => PullRequestSummary::default(),
        };
        Branch {
            name: wire.display_id,
            latest_commit: wire.latest_commit,
            latest_commit_ms: wire.metadata.latest_commit.author_timestamp,
            latest_commit_message: wire.metadata.latest_commit.message,
            pull_request,
        }
    }
}

// ── Pull request changes ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePage {
    #[serde(default)]
    pub values: Vec<WireChange>,
    #[serde(default)]
    pub is_last_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireChange {
    pub path: WirePath,
}

#[derive(Debug, Deserialize)]
pub struct WirePath {
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub name: String,
}

impl WirePath {
    /// `parent/name`, or just `name` at the repository root.
    pub fn joined(&self) -> String {
        if self.parent.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.parent, self.name)
        }
    }
}

impl ChangePage {
    pub fn paths(&self) -> BTreeSet<String> {
        self.values.iter().map(|c| c.path.joined()).collect()
    }
}
