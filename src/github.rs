//! # GitHub Repository Selection
//!
//! Selects repositories through the GitHub REST API: all repositories of an
//! organization whose name starts with a given prefix. Pages through
//! `/orgs/{org}/repos` until an empty page comes back and returns the HTTPS
//! clone URL of every match.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::selector::RepositorySelector;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

/// The slice of the repository object this selector needs.
#[derive(Debug, Deserialize)]
struct GhRepo {
    name: String,
    clone_url: String,
}

/// Selects an organization's repositories by name prefix via the GitHub API.
#[derive(Debug, Clone)]
pub struct GitHubOrgSelector {
    org: String,
    prefix: String,
    token: String,
    api_base: String,
}

impl GitHubOrgSelector {
    pub fn new(org: impl Into<String>, prefix: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            prefix: prefix.into(),
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the selector at a different API endpoint (GitHub Enterprise, a
    /// test server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn fetch_page(&self, page: usize) -> Result<Vec<GhRepo>> {
        let url = format!(
            "{}/orgs/{}/repos?per_page={}&page={}",
            self.api_base, self.org, PAGE_SIZE, page
        );
        let auth = format!("Bearer {}", self.token);
        let mut response = ureq::get(url.as_str())
            .header("Authorization", auth.as_str())
            .header("Accept", "application/vnd.github+json")
            .header(
                "User-Agent",
                concat!("repo-fleet/", env!("CARGO_PKG_VERSION")),
            )
            .call()
            .map_err(|e| Error::Selection {
                message: format!("GitHub API request for {} failed: {}", self.org, e),
            })?;
        response.body_mut().read_json().map_err(|e| Error::Selection {
            message: format!("could not parse GitHub API response: {}", e),
        })
    }
}

impl RepositorySelector for GitHubOrgSelector {
    fn uris(&self) -> Result<Vec<String>> {
        let mut uris = Vec::new();
        let mut page = 1;
        loop {
            let repos = self.fetch_page(page)?;
            if repos.is_empty() {
                break;
            }
            let full_page = repos.len() == PAGE_SIZE;
            uris.extend(filter_by_prefix(repos, &self.prefix));
            if !full_page {
                break;
            }
            page += 1;
        }
        Ok(uris)
    }
}

fn filter_by_prefix(repos: Vec<GhRepo>, prefix: &str) -> Vec<String> {
    repos
        .into_iter()
        .filter(|repo| repo.name.starts_with(prefix))
        .map(|repo| repo.clone_url)
        .collect()
}
