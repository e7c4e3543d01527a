use std::sync::Arc;

use allocwatch_model::AllocationView;
use tracing::{debug, instrument, warn};

use crate::{
    error::LoadError,
    metrics::{LoadOutcome, MetricsBackend},
    notify::{Notice, Notifier},
    store::ResourceStore,
    transport::{ClusterApi, QueryOptions},
};

/// Assembles the allocation view: the allocation first, then its job and the namespace list
/// in parallel.
#[derive(Clone)]
pub struct ModelLoader {
    api: Arc<dyn ClusterApi>,
    store: Arc<dyn ResourceStore>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<dyn MetricsBackend>,
}

impl ModelLoader {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        store: Arc<dyn ResourceStore>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn MetricsBackend>,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
            metrics,
        }
    }

    /// Load the view, reporting any failure as a notice instead of returning it.
    ///
    /// Returns `None` when the view could not be assembled.
    pub async fn load(&self, id: &str) -> Option<AllocationView> {
        match self.try_load(id).await {
            Ok(view) => {
                self.metrics.record_load(LoadOutcome::Ok);
                Some(view)
            }
            Err(e) => {
                warn!(allocation = id, error = %e, "allocation view failed to load");
                self.metrics.record_load(LoadOutcome::Error);
                self.notifier.notify(Notice::from_load_error(&e));
                None
            }
        }
    }

    /// Load the view, returning the first failure.
    ///
    /// Every successfully fetched entity is written to the store, even when a sibling
    /// fetch fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn try_load(&self, id: &str) -> Result<AllocationView, LoadError> {
        let plain = QueryOptions::plain();

        let allocation = self
            .api
            .allocation(id, &plain)
            .await
            .map_err(|source| LoadError::Allocation {
                id: id.to_string(),
                source,
            })?;
        debug!(index = allocation.index, "allocation fetched");
        self.store.put_allocation(allocation.clone());
        let allocation = allocation.value;

        let key = allocation
            .job_key()
            .ok_or_else(|| LoadError::MissingJob { id: id.to_string() })?;

        let (job, namespaces) = tokio::join!(self.api.job(&key, &plain), self.api.namespaces());

        let job = match job {
            Ok(job) => {
                self.store.put_job(job.clone());
                job.value
            }
            Err(source) => return Err(LoadError::Job { key, source }),
        };
        let namespaces = namespaces.map_err(|source| LoadError::Namespaces { source })?;
        self.store.put_namespaces(namespaces.clone());

        debug!(job = %key, namespaces = namespaces.len(), "dependencies resolved");
        Ok(AllocationView::new(allocation, job, namespaces))
    }
}
