use std::sync::Arc;

use allocwatch_model::{Allocation, Indexed, Job, JobKey, QueryIndex};
use async_trait::async_trait;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, trace, warn};

use crate::{
    config::WatchConfig,
    error::FetchError,
    metrics::{MetricsBackend, PollOutcome},
    store::ResourceStore,
    transport::{ClusterApi, QueryOptions},
    watch::{WatchHandle, WatcherKind},
};

/// A single record that can be long-polled and cached.
#[async_trait]
pub trait WatchedRecord: Send + Sync + 'static {
    type Record: Send + 'static;

    /// Resource type name, for logs.
    fn kind(&self) -> &'static str;

    /// Identity of the watched record.
    fn target(&self) -> String;

    async fn fetch(
        &self,
        api: &dyn ClusterApi,
        query: &QueryOptions,
    ) -> Result<Indexed<Self::Record>, FetchError>;

    fn last_index(&self, store: &dyn ResourceStore) -> Option<QueryIndex>;

    fn save(&self, store: &dyn ResourceStore, record: Indexed<Self::Record>);
}

/// Allocation identified by id.
#[derive(Debug, Clone)]
pub struct AllocationRecord(pub String);

#[async_trait]
impl WatchedRecord for AllocationRecord {
    type Record = Allocation;

    fn kind(&self) -> &'static str {
        "allocation"
    }

    fn target(&self) -> String {
        self.0.clone()
    }

    async fn fetch(
        &self,
        api: &dyn ClusterApi,
        query: &QueryOptions,
    ) -> Result<Indexed<Allocation>, FetchError> {
        api.allocation(&self.0, query).await
    }

    fn last_index(&self, store: &dyn ResourceStore) -> Option<QueryIndex> {
        store.allocation_index(&self.0)
    }

    fn save(&self, store: &dyn ResourceStore, record: Indexed<Allocation>) {
        store.put_allocation(record);
    }
}

/// Job identified by namespace and id.
///
/// The allocation screen only watches its allocation; this is for embedders that also keep the
/// owning job live.
#[derive(Debug, Clone)]
pub struct JobRecord(pub JobKey);

#[async_trait]
impl WatchedRecord for JobRecord {
    type Record = Job;

    fn kind(&self) -> &'static str {
        "job"
    }

    fn target(&self) -> String {
        self.0.to_string()
    }

    async fn fetch(
        &self,
        api: &dyn ClusterApi,
        query: &QueryOptions,
    ) -> Result<Indexed<Job>, FetchError> {
        api.job(&self.0, query).await
    }

    fn last_index(&self, store: &dyn ResourceStore) -> Option<QueryIndex> {
        store.job_index(&self.0)
    }

    fn save(&self, store: &dyn ResourceStore, record: Indexed<Job>) {
        store.put_job(record);
    }
}

/// Starts long-poll loops that keep one record current in the store.
///
/// Each iteration blocks on the server until a version newer than the stored index exists
/// (or the wait elapses), stores the answer and immediately asks again. Failures back off
/// and retry; only cancellation ends the loop.
#[derive(Clone)]
pub struct RecordWatcher {
    api: Arc<dyn ClusterApi>,
    store: Arc<dyn ResourceStore>,
    metrics: Arc<dyn MetricsBackend>,
    config: WatchConfig,
}

impl RecordWatcher {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        store: Arc<dyn ResourceStore>,
        metrics: Arc<dyn MetricsBackend>,
        config: WatchConfig,
    ) -> Self {
        Self {
            api,
            store,
            metrics,
            config,
        }
    }

    pub fn start<R: WatchedRecord>(
        &self,
        record: R,
        token: CancellationToken,
        tracker: &TaskTracker,
    ) -> WatchHandle {
        let this = self.clone();
        WatchHandle::spawn(
            WatcherKind::Record,
            record.target(),
            token,
            tracker,
            Arc::clone(&self.metrics),
            move |token| this.run(record, token),
        )
    }

    async fn run<R: WatchedRecord>(self, record: R, token: CancellationToken) {
        let target = record.target();
        let wait = self.config.long_poll_wait();
        let min_interval = self.config.min_interval();
        let mut failures: u32 = 0;

        debug!(kind = record.kind(), target = %target, "record watcher started");

        while !token.is_cancelled() {
            let index = record.last_index(self.store.as_ref()).unwrap_or(0);
            let query = QueryOptions::blocking(index, wait);

            let iteration = async {
                let (result, ()) = tokio::join!(
                    record.fetch(self.api.as_ref(), &query),
                    tokio::time::sleep(min_interval)
                );
                result
            };
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = iteration => result,
            };

            match result {
                Ok(fresh) => {
                    failures = 0;
                    if fresh.index < index {
                        debug!(
                            target = %target,
                            from = index,
                            to = fresh.index,
                            "index went backwards; resetting"
                        );
                    } else {
                        trace!(target = %target, index = fresh.index, "record refreshed");
                    }
                    record.save(self.store.as_ref(), fresh);
                    self.metrics.record_poll(WatcherKind::Record, PollOutcome::Ok);
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    self.metrics
                        .record_poll(WatcherKind::Record, PollOutcome::Error);

                    let delay = self.config.backoff.delay(failures);
                    warn!(
                        kind = record.kind(),
                        target = %target,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "long-poll failed; retrying",
                    );
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        debug!(kind = record.kind(), target = %target, "record watcher stopped");
    }
}
