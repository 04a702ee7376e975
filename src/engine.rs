//! # Run Orchestration
//!
//! The engine sequences a run over its fixed pipeline: prepare the working
//! directory, resolve the repository URIs, materialize every repository into
//! a numbered subdirectory, apply the primary action to each, apply the
//! finalization action to each (when configured), and finally clean up.
//!
//! ## Failure policy
//!
//! Every per-repository step (credential attachment, clone, action
//! application) is subject to the run's failure policy. Under strict-fail,
//! the first error aborts the run wrapped in [`Error::RunAborted`]. Under
//! lenient mode each error is reported through the status sink, recorded on
//! the repository's outcome, and the run continues; the run as a whole still
//! returns `Ok`, and the caller inspects the [`RunReport`] for per-repository
//! damage. Directory preparation and URI resolution happen before any
//! per-repository work, so their errors are fatal in both modes.
//!
//! ## Progress accounting
//!
//! A run has `repository count x phase count` steps, where the phases are
//! materialization, the primary action, and the finalization action when
//! present. Every completed unit of work advances the counter by one and
//! pushes the new fraction to the status listener.
//!
//! ## Concurrency
//!
//! The pipeline is strictly sequential; [`Fleet::run`] consumes the engine,
//! so a second concurrent run on the same instance cannot be expressed.
//! [`Fleet::run_detached`] moves the whole (still sequential) run onto a
//! background thread. No timeout is imposed on clones or actions; a hung
//! external process blocks the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;

use crate::action::RepositoryAction;
use crate::credentials::GitCredentials;
use crate::error::{Error, Result};
use crate::git::{CloneRequest, GitBackend, Repository, SystemGit};
use crate::selector::RepositorySelector;
use crate::status::{NullListener, StatusListener};
use crate::workdir;

/// The outcome of one repository within a finished run.
#[derive(Debug)]
pub struct RepoOutcome {
    /// The repository URI as supplied by the selector.
    pub uri: String,
    /// The ordinal assigned to the repository (names its subdirectory).
    pub ordinal: usize,
    /// The subdirectory the repository was (or would have been) cloned into.
    pub directory: PathBuf,
    /// Whether the repository was successfully materialized.
    pub materialized: bool,
    /// Errors recorded for this repository in lenient mode.
    pub errors: Vec<String>,
}

/// The result of a completed run.
///
/// A lenient run returns `Ok(RunReport)` even when individual repositories
/// failed; the per-repository outcomes carry those errors.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-repository outcomes, ordered by ordinal.
    pub repositories: Vec<RepoOutcome>,
}

impl RunReport {
    /// True when no repository recorded any error.
    pub fn is_clean(&self) -> bool {
        self.repositories.iter().all(|r| r.errors.is_empty())
    }

    /// Number of repositories that recorded at least one error.
    pub fn failure_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|r| !r.errors.is_empty())
            .count()
    }
}

/// Per-repository state while the run is in flight.
struct RepoSlot {
    ordinal: usize,
    directory: PathBuf,
    repository: Option<Repository>,
    errors: Vec<String>,
}

/// Builder for [`Fleet`]. Selector and primary action are mandatory; every
/// other collaborator has a default.
pub struct FleetBuilder {
    selector: Option<Box<dyn RepositorySelector>>,
    action: Option<Box<dyn RepositoryAction>>,
    finalization_action: Option<Box<dyn RepositoryAction>>,
    credentials: GitCredentials,
    listener: Box<dyn StatusListener>,
    working_dir: PathBuf,
    strict_fail: bool,
    cleanup: bool,
    backend: Box<dyn GitBackend>,
}

impl Default for FleetBuilder {
    fn default() -> Self {
        Self {
            selector: None,
            action: None,
            finalization_action: None,
            credentials: GitCredentials::Anonymous,
            listener: Box::new(NullListener),
            working_dir: PathBuf::from("./.repo-fleet_tmp"),
            strict_fail: true,
            cleanup: false,
            backend: Box::new(SystemGit),
        }
    }
}

impl FleetBuilder {
    /// The source of repository URIs. Mandatory.
    pub fn selector(mut self, selector: Box<dyn RepositorySelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// The action applied to every materialized repository. Mandatory.
    pub fn action(mut self, action: Box<dyn RepositoryAction>) -> Self {
        self.action = Some(action);
        self
    }

    /// A second action applied to every repository after the primary action
    /// has been applied to all of them.
    pub fn finalization_action(mut self, action: Box<dyn RepositoryAction>) -> Self {
        self.finalization_action = Some(action);
        self
    }

    /// Credentials attached to every clone. Defaults to anonymous.
    pub fn credentials(mut self, credentials: GitCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Receives progress fractions and messages. Defaults to discarding.
    pub fn status_listener(mut self, listener: Box<dyn StatusListener>) -> Self {
        self.listener = listener;
        self
    }

    /// The run's working directory. Defaults to `./.repo-fleet_tmp`.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Abort the whole run on the first error (`true`, the default), or
    /// record per-repository errors and continue (`false`).
    pub fn strict_fail(mut self, strict_fail: bool) -> Self {
        self.strict_fail = strict_fail;
        self
    }

    /// Remove the working directory when the run finishes. Defaults to
    /// `false`.
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Replace the clone backend. The default shells out to system `git`;
    /// tests inject mocks here.
    pub fn git_backend(mut self, backend: Box<dyn GitBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Validate the configuration and produce a runnable [`Fleet`].
    pub fn build(self) -> Result<Fleet> {
        let selector = self.selector.ok_or_else(|| Error::Config {
            message: "a repository selector is required".to_string(),
        })?;
        let action = self.action.ok_or_else(|| Error::Config {
            message: "a primary action is required".to_string(),
        })?;
        Ok(Fleet {
            selector,
            action,
            finalization_action: self.finalization_action,
            credentials: self.credentials,
            listener: self.listener,
            working_dir: self.working_dir,
            strict_fail: self.strict_fail,
            cleanup: self.cleanup,
            backend: self.backend,
        })
    }
}

/// The orchestration engine for one batch run across repositories.
pub struct Fleet {
    selector: Box<dyn RepositorySelector>,
    action: Box<dyn RepositoryAction>,
    finalization_action: Option<Box<dyn RepositoryAction>>,
    credentials: GitCredentials,
    listener: Box<dyn StatusListener>,
    working_dir: PathBuf,
    strict_fail: bool,
    cleanup: bool,
    backend: Box<dyn GitBackend>,
}

impl Fleet {
    pub fn builder() -> FleetBuilder {
        FleetBuilder::default()
    }

    /// Execute the run from start to finish.
    ///
    /// Consuming `self` is what guarantees at most one run per engine
    /// instance. When the cleanup flag is set, the working directory is
    /// removed on the way out even if a phase failed.
    pub fn run(self) -> Result<RunReport> {
        let Fleet {
            selector,
            action,
            finalization_action,
            credentials,
            listener,
            working_dir,
            strict_fail,
            cleanup,
            backend,
        } = self;

        workdir::prepare(&working_dir)?;
        let mut state = RunState {
            credentials,
            backend,
            strict_fail,
            working_dir,
            progress: Progress {
                complete: 0,
                total: 0,
                listener,
            },
        };
        state
            .progress
            .message("Prepared working directory for repositories.");

        let outcome = state.execute(
            selector.as_ref(),
            action.as_ref(),
            finalization_action.as_deref(),
        );

        if cleanup {
            state.progress.message("Removing all repositories.");
            workdir::remove_tree_logged(&state.working_dir);
        }
        outcome
    }

    /// Execute the run on a background thread and return its handle. The run
    /// itself stays fully sequential.
    pub fn run_detached(self) -> thread::JoinHandle<Result<RunReport>> {
        thread::spawn(move || self.run())
    }
}

/// Progress bookkeeping plus the status sink it feeds.
struct Progress {
    complete: usize,
    total: usize,
    listener: Box<dyn StatusListener>,
}

impl Progress {
    fn message(&self, text: &str) {
        self.listener.message_received(text);
    }

    fn step(&mut self) {
        self.complete += 1;
        if self.total > 0 {
            self.listener
                .progress_updated(self.complete as f64 / self.total as f64);
        }
    }

    fn finished(&self) {
        self.listener.progress_updated(1.0);
    }
}

/// Everything a run needs once the engine has been taken apart; keeping the
/// selector and actions outside avoids borrowing the state they run against.
struct RunState {
    credentials: GitCredentials,
    backend: Box<dyn GitBackend>,
    strict_fail: bool,
    working_dir: PathBuf,
    progress: Progress,
}

impl RunState {
    fn execute(
        &mut self,
        selector: &dyn RepositorySelector,
        action: &dyn RepositoryAction,
        finalization: Option<&dyn RepositoryAction>,
    ) -> Result<RunReport> {
        let uris = selector.uris().map_err(Error::aborted)?;

        let phase_count = if finalization.is_some() { 3 } else { 2 };
        self.progress.total = uris.len() * phase_count;

        if uris.is_empty() {
            self.progress
                .message("No repositories were selected; nothing to do.");
            self.progress.finished();
            return Ok(RunReport::default());
        }

        let mut slots = self.materialize(&uris)?;
        self.apply_to_all(&mut slots, action, "action")?;
        if let Some(finalization) = finalization {
            self.apply_to_all(&mut slots, finalization, "finalization action")?;
        }

        // Converting the slots into the report drops every live handle
        // exactly once.
        let mut repositories: Vec<RepoOutcome> = slots
            .into_iter()
            .map(|(uri, slot)| RepoOutcome {
                uri,
                ordinal: slot.ordinal,
                directory: slot.directory,
                materialized: slot.repository.is_some(),
                errors: slot.errors,
            })
            .collect();
        repositories.sort_by_key(|outcome| outcome.ordinal);
        Ok(RunReport { repositories })
    }

    /// Clone every repository into `<working_dir>/<ordinal>`, in URI order.
    /// Every attempt completes one progress step, whatever its outcome.
    fn materialize(&mut self, uris: &[String]) -> Result<HashMap<String, RepoSlot>> {
        let mut slots = HashMap::new();
        for (index, uri) in uris.iter().enumerate() {
            let ordinal = index + 1;
            let directory = self.working_dir.join(ordinal.to_string());
            self.progress.message(&format!(
                "Cloning repository {} to {}",
                uri,
                directory.display()
            ));

            let mut slot = RepoSlot {
                ordinal,
                directory: directory.clone(),
                repository: None,
                errors: Vec::new(),
            };
            match self.download(uri, &directory) {
                Ok(repository) => slot.repository = Some(repository),
                Err(err) => {
                    if self.strict_fail {
                        return Err(Error::aborted(err));
                    }
                    self.progress
                        .message(&format!("Failed to download repository {}: {}", uri, err));
                    log::warn!("failed to download {}: {}", uri, err);
                    slot.errors.push(err.to_string());
                }
            }
            slots.insert(uri.clone(), slot);
            self.progress.step();
        }
        Ok(slots)
    }

    /// Credential attachment and the clone itself are separate failure
    /// points, but both land in the same slot under the same policy.
    fn download(&self, uri: &str, directory: &Path) -> Result<Repository> {
        let mut request = CloneRequest::new(uri, directory);
        self.credentials.apply(&mut request)?;
        self.backend.clone_repository(&request)
    }

    fn apply_to_all(
        &mut self,
        slots: &mut HashMap<String, RepoSlot>,
        action: &dyn RepositoryAction,
        phase: &str,
    ) -> Result<()> {
        for (uri, slot) in slots.iter_mut() {
            match &slot.repository {
                Some(repository) => {
                    self.progress
                        .message(&format!("Applying {} to repository {}", phase, uri));
                    if let Err(err) = action.apply(repository) {
                        if self.strict_fail {
                            return Err(Error::aborted(err));
                        }
                        self.progress.message(&format!(
                            "Failed to apply {} to repository {}: {}",
                            phase, uri, err
                        ));
                        log::warn!("failed to apply {} to {}: {}", phase, uri, err);
                        slot.errors.push(err.to_string());
                    }
                }
                None => {
                    self.progress.message(&format!(
                        "Skipping {} on repository {} because it could not be downloaded.",
                        phase, uri
                    ));
                }
            }
            self.progress.step();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::selector::StaticSelector;

    /// Backend that "clones" by creating the target directory, failing for
    /// configured URIs, and recording every attempt.
    #[derive(Default)]
    struct MockGit {
        fail: Vec<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl GitBackend for MockGit {
        fn clone_repository(&self, request: &CloneRequest) -> Result<Repository> {
            self.calls.lock().unwrap().push(request.uri().to_string());
            if self.fail.iter().any(|uri| uri == request.uri()) {
                return Err(Error::Clone {
                    uri: request.uri().to_string(),
                    message: "repository not found".to_string(),
                    hint: None,
                });
            }
            fs::create_dir_all(request.target_dir())?;
            Ok(Repository::new(
                request.uri().to_string(),
                request.target_dir().to_path_buf(),
            ))
        }
    }

    #[derive(Default)]
    struct Recorded {
        messages: Mutex<Vec<String>>,
        fractions: Mutex<Vec<f64>>,
    }

    struct RecordingListener(Arc<Recorded>);

    impl StatusListener for RecordingListener {
        fn progress_updated(&self, fraction: f64) {
            self.0.fractions.lock().unwrap().push(fraction);
        }

        fn message_received(&self, message: &str) {
            self.0.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn uri(n: usize) -> String {
        format!("https://github.com/example/repo-{}.git", n)
    }

    fn counting_action(counter: &Arc<AtomicUsize>) -> Box<dyn RepositoryAction> {
        let counter = Arc::clone(counter);
        Box::new(move |_repo: &Repository| -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_build_requires_selector() {
        let counter = Arc::new(AtomicUsize::new(0));
        let result = Fleet::builder().action(counting_action(&counter)).build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_build_requires_action() {
        let result = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1)])))
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_strict_run_applies_action_once_per_repository() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let counter = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::new(Recorded::default());

        let report = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2), uri(3)])))
            .action(counting_action(&counter))
            .status_listener(Box::new(RecordingListener(Arc::clone(&recorded))))
            .working_dir(&work)
            .git_backend(Box::new(MockGit::default()))
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(report.is_clean());
        assert_eq!(report.repositories.len(), 3);
        assert!(report.repositories.iter().all(|r| r.materialized));
        assert_eq!(
            report.repositories.iter().map(|r| r.ordinal).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        // Two phases x three repositories, ending at exactly 100%.
        let fractions = recorded.fractions.lock().unwrap();
        assert_eq!(fractions.len(), 6);
        assert!((fractions.last().unwrap() - 1.0).abs() < 1e-9);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));

        // Cleanup was off, so the numbered working copies remain.
        assert!(work.join("1").is_dir());
        assert!(work.join("3").is_dir());
    }

    #[test]
    fn test_lenient_run_skips_unreachable_repository() {
        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::new(Recorded::default());

        let report = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2), uri(3)])))
            .action(counting_action(&counter))
            .status_listener(Box::new(RecordingListener(Arc::clone(&recorded))))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit {
                fail: vec![uri(2)],
                ..MockGit::default()
            }))
            .strict_fail(false)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(report.failure_count(), 1);
        let failed = report
            .repositories
            .iter()
            .find(|r| r.uri == uri(2))
            .unwrap();
        assert!(!failed.materialized);
        assert_eq!(failed.errors.len(), 1);

        let messages = recorded.messages.lock().unwrap();
        assert!(messages.iter().any(|m| m.starts_with("Skipping action")));

        let fractions = recorded.fractions.lock().unwrap();
        assert!((fractions.last().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_strict_run_aborts_at_first_clone_failure() {
        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(Mutex::new(Vec::new()));

        let result = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2), uri(3)])))
            .action(counting_action(&counter))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit {
                fail: vec![uri(1)],
                calls: Arc::clone(&calls),
            }))
            .build()
            .unwrap()
            .run();

        match result {
            Err(Error::RunAborted { source }) => {
                assert!(matches!(*source, Error::Clone { .. }));
            }
            other => panic!("expected RunAborted, got {:?}", other),
        }
        // No repository past the failing one was touched, and no action ran.
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cleanup_removes_working_directory_after_lenient_run() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let counter = Arc::new(AtomicUsize::new(0));

        Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2), uri(3)])))
            .action(counting_action(&counter))
            .working_dir(&work)
            .git_backend(Box::new(MockGit {
                fail: vec![uri(3)],
                ..MockGit::default()
            }))
            .strict_fail(false)
            .cleanup(true)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert!(!work.exists());
    }

    #[test]
    fn test_cleanup_runs_on_the_strict_error_path() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let counter = Arc::new(AtomicUsize::new(0));

        let result = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2)])))
            .action(counting_action(&counter))
            .working_dir(&work)
            .git_backend(Box::new(MockGit {
                fail: vec![uri(2)],
                ..MockGit::default()
            }))
            .cleanup(true)
            .build()
            .unwrap()
            .run();

        assert!(result.is_err());
        assert!(!work.exists());
    }

    #[test]
    fn test_second_run_reuses_working_directory() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let report = Fleet::builder()
                .selector(Box::new(StaticSelector::new([uri(1), uri(2)])))
                .action(counting_action(&counter))
                .working_dir(&work)
                .git_backend(Box::new(MockGit::default()))
                .build()
                .unwrap()
                .run()
                .unwrap();
            assert!(report.is_clean());
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_empty_selection_short_circuits() {
        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::new(Recorded::default());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let report = Fleet::builder()
            .selector(Box::new(StaticSelector::new(Vec::<String>::new())))
            .action(counting_action(&counter))
            .status_listener(Box::new(RecordingListener(Arc::clone(&recorded))))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit {
                fail: Vec::new(),
                calls: Arc::clone(&calls),
            }))
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert!(report.repositories.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(calls.lock().unwrap().is_empty());

        let fractions = recorded.fractions.lock().unwrap();
        assert_eq!(*fractions, vec![1.0]);
        let messages = recorded.messages.lock().unwrap();
        assert!(messages.iter().any(|m| m.contains("No repositories")));
    }

    #[test]
    fn test_finalization_runs_after_primary_for_every_repository() {
        let temp = TempDir::new().unwrap();
        let recorded = Arc::new(Recorded::default());
        let applications: Arc<Mutex<Vec<(String, &'static str)>>> =
            Arc::new(Mutex::new(Vec::new()));

        let primary_log = Arc::clone(&applications);
        let final_log = Arc::clone(&applications);

        let report = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2)])))
            .action(Box::new(move |repo: &Repository| -> Result<()> {
                primary_log
                    .lock()
                    .unwrap()
                    .push((repo.uri().to_string(), "primary"));
                Ok(())
            }))
            .finalization_action(Box::new(move |repo: &Repository| -> Result<()> {
                final_log
                    .lock()
                    .unwrap()
                    .push((repo.uri().to_string(), "finalization"));
                Ok(())
            }))
            .status_listener(Box::new(RecordingListener(Arc::clone(&recorded))))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit::default()))
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert!(report.is_clean());

        let log = applications.lock().unwrap();
        assert_eq!(log.len(), 4);
        // The primary phase finishes for every repository before the
        // finalization phase starts.
        let last_primary = log
            .iter()
            .rposition(|(_, phase)| *phase == "primary")
            .unwrap();
        let first_finalization = log
            .iter()
            .position(|(_, phase)| *phase == "finalization")
            .unwrap();
        assert!(last_primary < first_finalization);
        for n in 1..=2 {
            let primary = log
                .iter()
                .position(|(u, phase)| *u == uri(n) && *phase == "primary")
                .unwrap();
            let finalization = log
                .iter()
                .position(|(u, phase)| *u == uri(n) && *phase == "finalization")
                .unwrap();
            assert!(primary < finalization);
        }

        // Three phases x two repositories.
        let fractions = recorded.fractions.lock().unwrap();
        assert_eq!(fractions.len(), 6);
        assert!((fractions.last().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_error_is_fatal_even_in_lenient_mode() {
        struct FailingSelector;
        impl RepositorySelector for FailingSelector {
            fn uris(&self) -> Result<Vec<String>> {
                Err(Error::Selection {
                    message: "platform API unavailable".to_string(),
                })
            }
        }

        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let result = Fleet::builder()
            .selector(Box::new(FailingSelector))
            .action(counting_action(&counter))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit::default()))
            .strict_fail(false)
            .build()
            .unwrap()
            .run();

        assert!(matches!(result, Err(Error::RunAborted { .. })));
    }

    #[test]
    fn test_lenient_credential_failure_is_recorded_and_skipped() {
        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        // Token credentials cannot attach to an ssh-style URI, so the first
        // repository fails at the credential step, not the clone.
        let report = Fleet::builder()
            .selector(Box::new(StaticSelector::new([
                "git@github.com:example/repo-1.git".to_string(),
                uri(2),
            ])))
            .action(counting_action(&counter))
            .credentials(GitCredentials::token("tok"))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit::default()))
            .strict_fail(false)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(report.failure_count(), 1);
        let failed = report
            .repositories
            .iter()
            .find(|r| r.uri.starts_with("git@"))
            .unwrap();
        assert!(failed.errors[0].contains("Credential"));
    }

    #[test]
    fn test_strict_action_failure_aborts_with_cause() {
        let temp = TempDir::new().unwrap();

        let result = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1)])))
            .action(Box::new(|repo: &Repository| -> Result<()> {
                Err(Error::Action {
                    uri: repo.uri().to_string(),
                    message: "command exited with status 1".to_string(),
                })
            }))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit::default()))
            .build()
            .unwrap()
            .run();

        match result {
            Err(Error::RunAborted { source }) => {
                assert!(matches!(*source, Error::Action { .. }));
            }
            other => panic!("expected RunAborted, got {:?}", other),
        }
    }

    #[test]
    fn test_run_detached_resolves_with_the_report() {
        let temp = TempDir::new().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = Fleet::builder()
            .selector(Box::new(StaticSelector::new([uri(1), uri(2)])))
            .action(counting_action(&counter))
            .working_dir(temp.path().join("work"))
            .git_backend(Box::new(MockGit::default()))
            .cleanup(true)
            .build()
            .unwrap()
            .run_detached();

        let report = handle.join().unwrap().unwrap();
        assert!(report.is_clean());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
