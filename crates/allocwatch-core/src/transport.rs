use std::time::Duration;

use allocwatch_model::{Allocation, AllocationChecks, Indexed, Job, JobKey, Namespace, QueryIndex};
use async_trait::async_trait;

use crate::error::FetchError;

/// Blocking-query parameters of a read.
///
/// With an `index`, the server holds the request until it has a version newer than
/// that index or `wait` elapses, whichever comes first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub index: Option<QueryIndex>,
    pub wait: Option<Duration>,
}

impl QueryOptions {
    /// Plain point-in-time read.
    pub fn plain() -> Self {
        Self::default()
    }

    /// Long-poll read blocking on changes after `index`.
    pub fn blocking(index: QueryIndex, wait: Duration) -> Self {
        Self {
            index: Some(index),
            wait: Some(wait),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.index.is_some()
    }
}

/// Requests the watch subsystem issues against the orchestrator.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn allocation(
        &self,
        id: &str,
        query: &QueryOptions,
    ) -> Result<Indexed<Allocation>, FetchError>;

    async fn job(&self, key: &JobKey, query: &QueryOptions) -> Result<Indexed<Job>, FetchError>;

    async fn namespaces(&self) -> Result<Vec<Namespace>, FetchError>;

    /// Latest results of the orchestrator-run health checks of an allocation.
    async fn allocation_checks(&self, id: &str) -> Result<AllocationChecks, FetchError>;
}
