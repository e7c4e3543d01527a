//! Polling loops and the handles that control them.

mod record;
pub use record::{AllocationRecord, JobRecord, RecordWatcher, WatchedRecord};

mod poll;
pub use poll::{PollOperation, PollWatcher, ServiceHealthPoll};

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::metrics::MetricsBackend;

/// Role of a watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherKind {
    /// Long-poll on the version index of one record.
    Record,
    /// Fixed-cadence poll of a secondary read.
    Poll,
}

impl WatcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatcherKind::Record => "record",
            WatcherKind::Poll => "poll",
        }
    }
}

impl fmt::Display for WatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control token of one running watch loop.
///
/// Clones refer to the same loop. Cancelling is idempotent; the loop observes it at its next
/// suspension point and issues no further requests.
#[derive(Clone)]
pub struct WatchHandle {
    kind: WatcherKind,
    target: String,
    token: CancellationToken,
    finished: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Spawn `run` on `tracker` as the body of a new watch loop.
    pub(crate) fn spawn<F, Fut>(
        kind: WatcherKind,
        target: String,
        token: CancellationToken,
        tracker: &TaskTracker,
        metrics: Arc<dyn MetricsBackend>,
        run: F,
    ) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let finished = Arc::new(AtomicBool::new(false));
        let guard = FinishGuard {
            kind,
            finished: Arc::clone(&finished),
            metrics,
        };
        guard.metrics.watcher_started(kind);

        let body = run(token.clone());
        tracker.spawn(async move {
            let _guard = guard;
            body.await;
        });

        Self {
            kind,
            target,
            token,
            finished,
        }
    }

    pub fn kind(&self) -> WatcherKind {
        self.kind
    }

    /// Identity of the watched resource.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// `true` while the loop has neither been cancelled nor returned.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.is_finished()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `true` once the loop task has returned.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Marks the loop finished however its task ends, panics included.
struct FinishGuard {
    kind: WatcherKind,
    finished: Arc<AtomicBool>,
    metrics: Arc<dyn MetricsBackend>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Release);
        self.metrics.watcher_stopped(self.kind);
    }
}
