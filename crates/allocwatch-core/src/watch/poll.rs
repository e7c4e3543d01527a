use std::{sync::Arc, time::Duration};

use allocwatch_model::AllocationView;
use async_trait::async_trait;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, trace, warn};

use crate::{
    error::FetchError,
    metrics::{MetricsBackend, PollOutcome},
    store::ResourceStore,
    transport::ClusterApi,
    watch::{WatchHandle, WatcherKind},
};

/// Secondary read refreshed on a fixed cadence while a view is open.
#[async_trait]
pub trait PollOperation: Send + Sync {
    fn name(&self) -> &'static str;

    async fn poll(&self, view: &AllocationView) -> Result<(), FetchError>;
}

/// Pulls the orchestrator-run health check results of the allocation into the store.
#[derive(Clone)]
pub struct ServiceHealthPoll {
    api: Arc<dyn ClusterApi>,
    store: Arc<dyn ResourceStore>,
}

impl ServiceHealthPoll {
    pub fn new(api: Arc<dyn ClusterApi>, store: Arc<dyn ResourceStore>) -> Self {
        Self { api, store }
    }
}

#[async_trait]
impl PollOperation for ServiceHealthPoll {
    fn name(&self) -> &'static str {
        "service-health"
    }

    async fn poll(&self, view: &AllocationView) -> Result<(), FetchError> {
        let id = view.allocation_id();
        let checks = self.api.allocation_checks(id).await?;
        trace!(allocation = id, checks = checks.len(), "health checks fetched");
        self.store.merge_checks(id, checks);
        Ok(())
    }
}

/// Starts fixed-cadence loops: run the operation, sleep the interval, repeat.
///
/// Unlike [`RecordWatcher`](super::RecordWatcher) nothing here depends on server-side change
/// detection. A failed run is logged and the cadence is kept.
#[derive(Clone)]
pub struct PollWatcher {
    metrics: Arc<dyn MetricsBackend>,
    interval: Duration,
}

impl PollWatcher {
    pub fn new(metrics: Arc<dyn MetricsBackend>, interval: Duration) -> Self {
        Self { metrics, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn start(
        &self,
        view: Arc<AllocationView>,
        operation: Arc<dyn PollOperation>,
        token: CancellationToken,
        tracker: &TaskTracker,
    ) -> WatchHandle {
        let this = self.clone();
        WatchHandle::spawn(
            WatcherKind::Poll,
            view.allocation_id().to_string(),
            token,
            tracker,
            Arc::clone(&self.metrics),
            move |token| this.run(view, operation, token),
        )
    }

    async fn run(
        self,
        view: Arc<AllocationView>,
        operation: Arc<dyn PollOperation>,
        token: CancellationToken,
    ) {
        let target = view.allocation_id();
        debug!(
            operation = operation.name(),
            target,
            interval_ms = self.interval.as_millis() as u64,
            "poll watcher started"
        );

        while !token.is_cancelled() {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = operation.poll(&view) => result,
            };

            match result {
                Ok(()) => self.metrics.record_poll(WatcherKind::Poll, PollOutcome::Ok),
                Err(e) => {
                    self.metrics.record_poll(WatcherKind::Poll, PollOutcome::Error);
                    warn!(
                        operation = operation.name(),
                        target,
                        error = %e,
                        "poll failed; keeping cadence"
                    );
                }
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(operation = operation.name(), target, "poll watcher stopped");
    }
}
