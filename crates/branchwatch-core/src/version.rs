use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const CHANGED_BRANCH_KEY: &str = "changed_branch";
pub const REF_KEY: &str = "ref";
pub const BRANCHES_KEY: &str = "the_branches";

/// One emitted version: the change that triggered it plus every branch
/// currently tracked.
///
/// On the wire this is a flat object of three strings; the tracked list is
/// comma-joined into `the_branches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, String>",
    from = "BTreeMap<String, String>"
)]
pub struct Version {
    pub changed_branch: String,
    pub git_ref: String,
    /// `name::commit` tokens, fetch order.
    pub branches: Vec<String>,
}

impl Version {
    pub fn new(changed_branch: impl Into<String>, git_ref: impl Into<String>) -> Self {
        Self {
            changed_branch: changed_branch.into(),
            git_ref: git_ref.into(),
            branches: Vec::new(),
        }
    }

    /// Flatten into the three-field wire mapping.
    pub fn encode(&self) -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        m.insert(CHANGED_BRANCH_KEY.to_string(), self.changed_branch.clone());
        m.insert(REF_KEY.to_string(), self.git_ref.clone());
        m.insert(BRANCHES_KEY.to_string(), self.branches.join(","));
        m
    }

    /// Rebuild from the wire mapping. Missing keys read as empty strings and an
    /// empty `the_branches` gives an empty list.
    pub fn decode(m: &BTreeMap<String, String>) -> Self {
        let field = |key: &str| m.get(key).cloned().unwrap_or_default();
        let joined = field(BRANCHES_KEY);
        let branches = if joined.is_empty() {
            Vec::new()
        } else {
            joined.split(',').map(str::to_string).collect()
        };
        Self {
            changed_branch: field(CHANGED_BRANCH_KEY),
            git_ref: field(REF_KEY),
            branches,
        }
    }
}

impl From<Version> for BTreeMap<String, String> {
    fn from(v: Version) -> Self {
        v.encode()
    }
}

impl From<BTreeMap<String, String>> for Version {
    fn from(m: BTreeMap<String, String>) -> Self {
        Version::decode(&m)
    }
}
