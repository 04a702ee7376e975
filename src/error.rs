//! # Error Handling
//!
//! Centralized error handling for `repo-fleet`, built on `thiserror`. A single
//! `Error` enum covers every anticipated failure mode, and the `Result<T>`
//! alias is used throughout the crate.
//!
//! Two variants deserve special mention:
//!
//! - **`DirectoryNotEmpty`** is raised when the working directory already
//!   contains files that were not produced by a previous run. It is always
//!   fatal; the run never merges into or destroys foreign content.
//!
//! - **`RunAborted`** is the run-level wrapper used in strict-fail mode. When
//!   any per-repository step fails under strict mode, the underlying error is
//!   boxed into `RunAborted` and returned to the caller, so the cause is
//!   preserved through `std::error::Error::source`.
//!
//! Cleanup failures have no variant here: cleanup is best-effort and its
//! errors are only ever logged.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for repo-fleet operations
#[derive(Error, Debug)]
pub enum Error {
    /// The working directory exists, is not empty, and was not produced by a
    /// previous run of this tool.
    #[error("Working directory {path} is not empty; refusing to reuse it")]
    DirectoryNotEmpty { path: PathBuf },

    /// Resolving the list of repository URIs failed.
    #[error("Repository selection error: {message}")]
    Selection { message: String },

    /// Credentials could not be attached to a clone operation.
    #[error("Credential error: {message}")]
    Credential { message: String },

    /// A repository could not be materialized into its working copy.
    ///
    /// Includes the repository URI, the underlying message, and an optional
    /// hint for resolution.
    #[error("Clone error for {uri}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Clone {
        uri: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// An action failed for a repository, including a non-zero exit code from
    /// an external command.
    #[error("Action failed for {uri}: {message}")]
    Action { uri: String, message: String },

    /// The run configuration is invalid (e.g. a mandatory collaborator is
    /// missing). Raised at build time, not at first use.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Run-level wrapper raised in strict-fail mode; carries the original
    /// cause of the abort.
    #[error("Run aborted: {source}")]
    RunAborted {
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an error into the strict-mode run-level error.
    pub(crate) fn aborted(cause: Error) -> Error {
        Error::RunAborted {
            source: Box::new(cause),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
