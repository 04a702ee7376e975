//! Status reporting for an in-flight run.
//!
//! The engine pushes two kinds of updates to a [`StatusListener`]: discrete
//! progress fractions and human-readable messages. The CLI implements this
//! trait over an `indicatif` progress bar; library users can plug in anything.

/// Receives updates while a run is in progress.
pub trait StatusListener: Send + Sync {
    /// Called when the run's overall progress changes.
    ///
    /// `fraction` is in the range `0.0..=1.0`.
    fn progress_updated(&self, fraction: f64);

    /// Called when the run emits a human-readable message.
    fn message_received(&self, message: &str);
}

/// A listener that discards all updates. The default for runs built without
/// an explicit listener.
#[derive(Debug, Default)]
pub struct NullListener;

impl StatusListener for NullListener {
    fn progress_updated(&self, _fraction: f64) {}
    fn message_received(&self, _message: &str) {}
}

/// A listener that routes updates through the `log` facade: messages at info
/// level, progress at debug level.
#[derive(Debug, Default)]
pub struct LogListener;

impl StatusListener for LogListener {
    fn progress_updated(&self, fraction: f64) {
        log::debug!("progress: {:.1}%", fraction * 100.0);
    }

    fn message_received(&self, message: &str) {
        log::info!("{}", message);
    }
}
