//! # Git Clone Operations
//!
//! This module materializes remote repositories into local working copies by
//! shelling out to the system `git` command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Any authentication configured in ~/.gitconfig
//!
//! Credentials supplied through [`crate::credentials::GitCredentials`] are
//! layered on top by mutating the [`CloneRequest`] before it is executed
//! (rewriting the effective URL, adding environment variables).
//!
//! The [`GitBackend`] trait is the seam between the engine and the real
//! `git` executable. The engine only ever talks to the trait, so tests can
//! inject a mock backend and exercise the whole pipeline without network
//! access or a `git` installation.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// A pending clone operation: where to clone from, where to clone to, and
/// any environment the transport needs.
///
/// `uri` is the identity of the repository within the run and never changes.
/// `url` starts out equal to `uri` but may be rewritten by a credential
/// provider (e.g. to embed an access token).
#[derive(Debug, Clone)]
pub struct CloneRequest {
    uri: String,
    url: String,
    target_dir: PathBuf,
    env: Vec<(String, String)>,
}

impl CloneRequest {
    /// Create a request to clone `uri` into `target_dir`.
    pub fn new(uri: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        let uri = uri.into();
        Self {
            url: uri.clone(),
            uri,
            target_dir: target_dir.into(),
            env: Vec::new(),
        }
    }

    /// The repository URI as supplied by the selector.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URL the clone will actually use. Equal to [`Self::uri`] unless a
    /// credential provider rewrote it.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replace the effective clone URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// The directory the repository will be cloned into.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Add an environment variable for the clone process.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.push((key.into(), value.into()));
    }

    /// Environment variables added for the clone process.
    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }
}

/// A handle to a materialized repository working copy.
///
/// Releasing the handle is dropping it; the working copy on disk stays until
/// the run's cleanup phase removes the working directory.
#[derive(Debug)]
pub struct Repository {
    uri: String,
    work_tree: PathBuf,
}

impl Repository {
    pub(crate) fn new(uri: String, work_tree: PathBuf) -> Self {
        Self { uri, work_tree }
    }

    /// The URI this repository was cloned from.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The repository's working tree on disk.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }
}

/// Trait for clone execution - allows mocking in tests
pub trait GitBackend: Send + Sync {
    /// Execute a clone and return a handle to the resulting working copy.
    fn clone_repository(&self, request: &CloneRequest) -> Result<Repository>;
}

/// The default backend, which runs the system `git clone` command.
#[derive(Debug, Default)]
pub struct SystemGit;

impl GitBackend for SystemGit {
    fn clone_repository(&self, request: &CloneRequest) -> Result<Repository> {
        let mut command = Command::new("git");
        command
            .arg("clone")
            .arg(request.url())
            .arg(request.target_dir());
        for (key, value) in request.envs() {
            command.env(key, value);
        }

        let output = command.output().map_err(|e| Error::Clone {
            uri: request.uri().to_string(),
            message: e.to_string(),
            hint: Some("Make sure the git command is installed and on PATH.".to_string()),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            // Attach a hint for the common auth failures
            let hint = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("could not read Username")
                || stderr.contains("Could not read from remote repository")
            {
                Some(
                    "Authentication failed. For private repositories, supply an \
                     access token or an SSH key."
                        .to_string(),
                )
            } else {
                None
            };

            return Err(Error::Clone {
                uri: request.uri().to_string(),
                message: stderr,
                hint,
            });
        }

        Ok(Repository::new(
            request.uri().to_string(),
            request.target_dir().to_path_buf(),
        ))
    }
}
