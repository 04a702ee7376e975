//! CLI argument parsing and run execution

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use repo_fleet::action::CommandAction;
use repo_fleet::credentials::GitCredentials;
use repo_fleet::engine::{Fleet, RunReport};
use repo_fleet::selector;
use repo_fleet::status::{NullListener, StatusListener};

/// Repo Fleet - run a command across many git repositories
#[derive(Parser, Debug)]
#[command(name = "repo-fleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Working directory for the run; every repository is cloned into a
    /// numbered subdirectory of it
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "PATH",
        default_value = "./.repo-fleet_tmp"
    )]
    working_dir: PathBuf,

    /// Repository selector expression: "org-repo-prefix:ORG/PREFIX",
    /// "file:PATH[;PATH...]", or "stdin"
    #[arg(short, long, value_name = "EXPR")]
    selector: String,

    /// Command to run in each repository
    #[arg(short, long, value_name = "COMMAND")]
    action: String,

    /// Command to run in each repository after all primary actions finished
    #[arg(short = 'f', long, value_name = "COMMAND")]
    finalization_action: Option<String>,

    /// Access token used for the platform API and for HTTPS clones
    #[arg(short = 't', long, value_name = "TOKEN", env = "REPO_FLEET_TOKEN")]
    access_token: Option<String>,

    /// Abort the whole run on the first error; pass false to record
    /// per-repository failures and continue
    #[arg(
        long,
        value_name = "BOOL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    strict_fail: bool,

    /// Remove the working directory when the run finishes
    #[arg(short, long)]
    cleanup: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Execute the run described by the parsed arguments.
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .init();

        let selector = selector::parse_expression(&self.selector, self.access_token.as_deref())?;
        let action = CommandAction::from_command_line(&self.action)?;
        let credentials = match &self.access_token {
            Some(token) => GitCredentials::token(token.clone()),
            None => GitCredentials::Anonymous,
        };

        let bar = ProgressBar::new(100);
        bar.set_style(ProgressStyle::with_template("[{bar:40}] {pos:>3}%").expect("bar template"));
        let listener: Box<dyn StatusListener> = if self.quiet {
            Box::new(NullListener)
        } else {
            Box::new(BarListener(bar.clone()))
        };

        let mut builder = Fleet::builder()
            .selector(selector)
            .action(Box::new(action))
            .credentials(credentials)
            .status_listener(listener)
            .working_dir(self.working_dir)
            .strict_fail(self.strict_fail)
            .cleanup(self.cleanup);
        if let Some(command) = &self.finalization_action {
            builder =
                builder.finalization_action(Box::new(CommandAction::from_command_line(command)?));
        }

        let result = builder.build()?.run();
        bar.finish_and_clear();

        match result {
            Ok(report) => {
                if !self.quiet {
                    print_summary(&report);
                }
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Feeds engine status into an `indicatif` progress bar. When the bar is
/// hidden (no terminal), messages fall back to standard error so they are
/// not lost.
struct BarListener(ProgressBar);

impl StatusListener for BarListener {
    fn progress_updated(&self, fraction: f64) {
        self.0.set_position((fraction * 100.0).round() as u64);
    }

    fn message_received(&self, message: &str) {
        if self.0.is_hidden() {
            eprintln!("{}", message);
        } else {
            self.0.println(message);
        }
    }
}

fn print_summary(report: &RunReport) {
    let total = report.repositories.len();
    let failed = report.failure_count();
    if failed == 0 {
        println!(
            "{} {} repositories processed",
            console::style("✔").green(),
            total
        );
    } else {
        println!(
            "{} {} of {} repositories had failures:",
            console::style("✘").red(),
            failed,
            total
        );
        for outcome in report.repositories.iter().filter(|r| !r.errors.is_empty()) {
            println!("  {} {}", console::style("-").dim(), outcome.uri);
            for error in &outcome.errors {
                println!("      {}", error);
            }
        }
    }
}
