use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::{FetchError, LoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Notice shown when the allocation screen cannot be assembled.
    pub fn from_load_error(err: &LoadError) -> Self {
        let title = match err.fetch_error() {
            Some(FetchError::NotFound(_)) => "Not Found",
            Some(FetchError::Forbidden(_)) => "Not Authorized",
            _ => "Could Not Load Allocation",
        };
        Notice::error(title, err.to_string())
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Sink for user-visible notifications.
///
/// Implementations must not block; the caller is on the load path of a screen.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => info!(title = %notice.title, "{}", notice.message),
            Severity::Warning => warn!(title = %notice.title, "{}", notice.message),
            Severity::Error => error!(title = %notice.title, "{}", notice.message),
        }
    }
}

/// Forwards notices to a channel drained by the rendering layer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // Receiver gone means nobody renders anymore; dropping the notice is fine.
        let _ = self.tx.send(notice);
    }
}
