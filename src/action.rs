//! # Repository Actions
//!
//! An action is the unit of work applied to each materialized repository.
//! Closures implement [`RepositoryAction`] directly, so library callers can
//! pass `|repo| { ... }`; the CLI uses [`CommandAction`], which runs an
//! external command inside the repository's working tree.

use std::process::Command;

use crate::error::{Error, Result};
use crate::git::Repository;

/// Environment variable exposing the directory the host program was invoked
/// from to command actions.
pub const INVOKE_DIR_VAR: &str = "REPO_FLEET_INVOKE_DIR";

/// Environment variable exposing the run's working directory (the parent of
/// every repository working copy) to command actions.
pub const WORKING_DIR_VAR: &str = "REPO_FLEET_WORKING_DIR";

/// An action that can be applied to a materialized repository.
pub trait RepositoryAction: Send + Sync {
    /// Perform the action. Any `Err` counts as a failed application and is
    /// subject to the run's failure policy.
    fn apply(&self, repo: &Repository) -> Result<()>;
}

impl<F> RepositoryAction for F
where
    F: Fn(&Repository) -> Result<()> + Send + Sync,
{
    fn apply(&self, repo: &Repository) -> Result<()> {
        self(repo)
    }
}

/// Runs an external command with the repository's working tree as the
/// process's current directory.
///
/// Standard I/O streams are inherited from the host process, so interactive
/// scripts and their output flow straight through. The child sees two extra
/// environment variables: [`INVOKE_DIR_VAR`] and [`WORKING_DIR_VAR`]. A
/// non-zero exit code fails the action.
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: String,
    args: Vec<String>,
}

impl CommandAction {
    /// Create an action from a program and its arguments.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create an action from a whitespace-separated command line, e.g.
    /// `"git checkout -b update-ci"`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| Error::Config {
            message: "action command is empty".to_string(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl RepositoryAction for CommandAction {
    fn apply(&self, repo: &Repository) -> Result<()> {
        let invoke_dir = std::env::current_dir()?;
        let working_dir = repo
            .work_tree()
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| invoke_dir.clone());

        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(repo.work_tree())
            .env(INVOKE_DIR_VAR, &invoke_dir)
            .env(WORKING_DIR_VAR, &working_dir)
            .status()
            .map_err(|e| Error::Action {
                uri: repo.uri().to_string(),
                message: format!("failed to start {}: {}", self.program, e),
            })?;

        if !status.success() {
            return Err(Error::Action {
                uri: repo.uri().to_string(),
                message: format!("command {} exited with {}", self.program, status),
            });
        }
        Ok(())
    }
}
