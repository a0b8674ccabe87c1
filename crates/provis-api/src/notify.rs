// User-facing notifications
//
// The client and the core facade report outcomes through a `Notifier`
// instead of printing directly. The CLI renders them on stderr; library
// consumers get `TracingNotifier` by default.

use tracing::{error, info};

/// Message shown when a failure carries no application error code.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Sink for short user-facing messages.
pub trait Notifier: Send + Sync {
    /// An operation completed.
    fn success(&self, message: &str);

    /// An operation failed.
    fn failure(&self, message: &str);

    /// The generic error toast for unstructured or server failures.
    fn generic_error(&self) {
        self.failure(GENERIC_ERROR_MESSAGE);
    }
}

/// Notifier that forwards messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "provis::notify", "{message}");
    }

    fn failure(&self, message: &str) {
        error!(target: "provis::notify", "{message}");
    }
}
