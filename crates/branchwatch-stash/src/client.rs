use std::collections::BTreeSet;

use base64::Engine;
use branchwatch_core::{Branch, BranchSource, Error, Result, Source};
use serde::de::DeserializeOwned;

use crate::transport::{HttpRequest, Transport};
use crate::wire::{BranchPage, ChangePage};

const API_PREFIX: &str = "/rest/api/1.0";
/// Branch page size; the resource reads a single page.
const BRANCH_LIMIT: u32 = 1000;
/// Max bytes of an error body quoted in a transport error.
const ERROR_BODY_PREVIEW: usize = 200;

/// [`BranchSource`] backed by the Bitbucket Server REST API.
pub struct StashClient<T: Transport> {
    transport: T,
    repo_url: String,
    authorization: Option<String>,
}

impl<T: Transport> StashClient<T> {
    pub fn new(source: &Source, transport: T) -> Result<Self> {
        source.require_server()?;
        let repo_url = format!(
            "{}{API_PREFIX}/projects/{}/repos/{}",
            source.base_url(),
            source.project_name,
            source.repo_name
        );
        let authorization = (!source.username.is_empty()).then(|| {
            let raw = format!("{}:{}", source.username, source.password);
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(raw)
            )
        });
        Ok(Self {
            transport,
            repo_url,
            authorization,
        })
    }

    pub fn branches_url(&self) -> String {
        format!(
            "{}/branches?limit={BRANCH_LIMIT}&details=true",
            self.repo_url
        )
    }

    pub fn changes_url(&self, pull_request_id: u64) -> String {
        format!("{}/pull-requests/{pull_request_id}/changes", self.repo_url)
    }

    fn get_json<D: DeserializeOwned>(&self, url: &str, what: &str) -> Result<D> {
        let mut request = HttpRequest::get(url).header("Accept", "application/json");
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth.as_str());
        }
        tracing::debug!(url, "GET");
        let response = self.transport.execute(&request)?;
        if !response.is_success() {
            let preview: String = response.body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(Error::transport(
                url,
                format!("expected 2xx response but got {}: {preview}", response.status),
            ));
        }
        serde_json::from_str(&response.body).map_err(|e| Error::decode(what, e))
    }
}

impl<T: Transport> BranchSource for StashClient<T> {
    fn fetch_branches(&self) -> Result<Vec<Branch>> {
        let page: BranchPage = self.get_json(&self.branches_url(), "branches response")?;
        let branches: Vec<Branch> = page.values.into_iter().map(Branch::from).collect();
        tracing::info!(count = branches.len(), "fetched branches");
        Ok(branches)
    }

    fn changed_paths(&self, pull_request_id: u64) -> Result<BTreeSet<String>> {
        let page: ChangePage = self.get_json(
            &self.changes_url(pull_request_id),
            "pull request changes response",
        )?;
        if !page.is_last_page {
            return Err(Error::Unsupported(format!(
                "pull request {pull_request_id} has a paged change list; \
                 pull requests this large are not handled"
            )));
        }
        let paths = page.paths();
        tracing::debug!(pull_request_id, count = paths.len(), "fetched changed paths");
        Ok(paths)
    }
}
