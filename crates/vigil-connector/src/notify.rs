//! User-visible notification delivery.
//!
//! Connectors report failures through toasts (transient, user-facing) and
//! alerts (persistent, administrator-facing). Delivery is injected so tests
//! and headless jobs can capture or drop messages instead of routing them
//! through the real notification pipeline.

use std::sync::Mutex;

use tracing::{error, warn};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Show a transient message to the acting user.
    fn toast(&self, severity: Severity, message: &str);

    /// Raise a persistent administrator alert.
    fn alert(&self, message: &str);
}

/// Notifier that writes to the log instead of a delivery channel.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn toast(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!(target: "notify", "{message}"),
            _ => warn!(target: "notify", "{message}"),
        }
    }

    fn alert(&self, message: &str) {
        error!(target: "notify", alert = true, "{message}");
    }
}

/// Notifier that records messages for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<(Severity, String)>>,
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Create a new recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts shown so far.
    pub fn toasts(&self) -> Vec<(Severity, String)> {
        self.toasts.lock().expect("notifier poisoned").clone()
    }

    /// Alerts raised so far.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("notifier poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&self, severity: Severity, message: &str) {
        self.toasts
            .lock()
            .expect("notifier poisoned")
            .push((severity, message.to_string()));
    }

    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .expect("notifier poisoned")
            .push(message.to_string());
    }
}
