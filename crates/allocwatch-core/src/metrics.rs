use crate::watch::WatcherKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ok,
    Error,
}

impl LoadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOutcome::Ok => "ok",
            LoadOutcome::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ok,
    Error,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Ok => "ok",
            PollOutcome::Error => "error",
        }
    }
}

/// Metrics seam of the watch subsystem.
///
/// Implementations must be cheap and non-blocking: they are called from inside the watch loops.
pub trait MetricsBackend: Send + Sync {
    fn record_load(&self, outcome: LoadOutcome);
    fn record_poll(&self, watcher: WatcherKind, outcome: PollOutcome);
    fn watcher_started(&self, watcher: WatcherKind);
    fn watcher_stopped(&self, watcher: WatcherKind);
}

/// Backend that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_load(&self, _outcome: LoadOutcome) {}
    fn record_poll(&self, _watcher: WatcherKind, _outcome: PollOutcome) {}
    fn watcher_started(&self, _watcher: WatcherKind) {}
    fn watcher_stopped(&self, _watcher: WatcherKind) {}
}
