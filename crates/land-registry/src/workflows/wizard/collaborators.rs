use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Fire-and-forget notification surface (snackbar, log, test recorder).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Moves the user to another page after a flow finishes.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

/// Sink that only writes notifications to the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::warn!(message = %notification.message, "user notification"),
            _ => tracing::info!(
                message = %notification.message,
                severity = ?notification.severity,
                "user notification"
            ),
        }
    }
}
