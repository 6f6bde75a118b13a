/// Separator between branch name and commit id inside a tracked-branch token.
/// Neither git ref names nor commit ids can contain it.
pub const BRANCH_COMMIT_SEPARATOR: &str = "::";

/// Pull request state as far as the filters care: OPEN or anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    /// MERGED, DECLINED or any other state reported by the server.
    Other,
    #[default]
    Absent,
}

impl PullRequestState {
    pub fn from_wire(state: &str) -> Self {
        match state {
            "OPEN" => PullRequestState::Open,
            "" => PullRequestState::Absent,
            _ => PullRequestState::Other,
        }
    }
}

/// Outgoing pull request metadata attached to a branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub state: PullRequestState,
    /// Number of open pull requests from this branch.
    pub open_count: i64,
    /// Pull request id; `None` when the branch has no pull request.
    pub id: Option<u64>,
}

impl PullRequestSummary {
    /// True when the branch has an OPEN pull request or a positive open count.
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open || self.open_count > 0
    }
}

/// Snapshot of one branch from a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub latest_commit: String,
    /// Author timestamp of the latest commit, epoch millis.
    pub latest_commit_ms: i64,
    pub latest_commit_message: String,
    pub pull_request: PullRequestSummary,
}

impl Branch {
    /// `name::commit` token recorded in the tracked-branch list.
    pub fn tracked_token(&self) -> String {
        format!(
            "{}{BRANCH_COMMIT_SEPARATOR}{}",
            self.name, self.latest_commit
        )
    }
}

/// Split a `name::commit` token. Returns `None` when the separator is missing.
pub fn split_tracked_token(token: &str) -> Option<(&str, &str)> {
    token.split_once(BRANCH_COMMIT_SEPARATOR)
}
