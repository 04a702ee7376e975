//! # Repo Fleet Library
//!
//! This library fans an action out over a set of git repositories: it
//! resolves a list of repository URIs, clones each into an isolated
//! subdirectory of a run-scoped working directory, applies a caller-supplied
//! action to each working copy, optionally applies a second finalization
//! action, and reports progress along the way. It powers the `repo-fleet`
//! command-line tool but can be embedded into any application that needs
//! bulk repository maintenance.
//!
//! ## Quick Example
//!
//! ```no_run
//! use repo_fleet::action::CommandAction;
//! use repo_fleet::engine::Fleet;
//! use repo_fleet::selector::StaticSelector;
//!
//! # fn main() -> repo_fleet::error::Result<()> {
//! let report = Fleet::builder()
//!     .selector(Box::new(StaticSelector::new([
//!         "https://github.com/example/service-auth.git",
//!         "https://github.com/example/service-billing.git",
//!     ])))
//!     .action(Box::new(CommandAction::from_command_line("git grep -l TODO")?))
//!     .strict_fail(false)
//!     .cleanup(true)
//!     .build()?
//!     .run()?;
//! println!("{} repositories had failures", report.failure_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! - **Selectors (`selector`, `github`)**: produce the list of repository
//!   URIs for a run - from a fixed list, files, standard input, or the
//!   GitHub API.
//! - **Credentials (`credentials`)**: attached to each clone operation
//!   before it runs; access-token and SSH-key variants are provided.
//! - **Actions (`action`)**: the work applied to each cloned repository,
//!   typically an external command run inside the working copy.
//! - **Engine (`engine`)**: sequences the whole run - prepare, select,
//!   materialize, apply, finalize, clean up - under a strict or lenient
//!   failure policy, with progress pushed to a status listener.
//!
//! The engine is deliberately sequential; see the `engine` module docs for
//! the failure-policy and progress semantics.

pub mod action;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod git;
pub mod github;
pub mod selector;
pub mod status;
pub mod workdir;
