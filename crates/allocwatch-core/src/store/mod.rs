use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use allocwatch_model::{
    Allocation, AllocationChecks, AllocationId, Indexed, Job, JobKey, Namespace, QueryIndex,
};

/// Identity-keyed cache the dashboard renders from.
///
/// Writes replace a single entity by identity (last writer wins); nothing is mutated in place
/// except health checks, which merge per check id.
pub trait ResourceStore: Send + Sync {
    fn put_allocation(&self, allocation: Indexed<Allocation>);
    fn allocation(&self, id: &str) -> Option<Allocation>;
    /// Index of the last stored version of an allocation.
    fn allocation_index(&self, id: &str) -> Option<QueryIndex>;

    fn put_job(&self, job: Indexed<Job>);
    fn job(&self, key: &JobKey) -> Option<Job>;
    fn job_index(&self, key: &JobKey) -> Option<QueryIndex>;

    fn put_namespaces(&self, namespaces: Vec<Namespace>);
    fn namespaces(&self) -> Vec<Namespace>;

    fn merge_checks(&self, allocation_id: &str, checks: AllocationChecks);
    fn checks(&self, allocation_id: &str) -> Option<AllocationChecks>;
}

/// In-memory resource store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    allocations: HashMap<AllocationId, Indexed<Allocation>>,
    jobs: HashMap<JobKey, Indexed<Job>>,
    namespaces: Vec<Namespace>,
    /// Health checks indexed by allocation id.
    checks: HashMap<AllocationId, AllocationChecks>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached allocations.
    pub fn allocation_count(&self) -> usize {
        self.read().allocations.len()
    }

    // A panic while holding the lock cannot leave a map half-written, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResourceStore for MemoryStore {
    fn put_allocation(&self, allocation: Indexed<Allocation>) {
        let mut inner = self.write();
        inner
            .allocations
            .insert(allocation.value.id.clone(), allocation);
    }

    fn allocation(&self, id: &str) -> Option<Allocation> {
        self.read().allocations.get(id).map(|a| a.value.clone())
    }

    fn allocation_index(&self, id: &str) -> Option<QueryIndex> {
        self.read().allocations.get(id).map(|a| a.index)
    }

    fn put_job(&self, job: Indexed<Job>) {
        let mut inner = self.write();
        inner.jobs.insert(job.value.key(), job);
    }

    fn job(&self, key: &JobKey) -> Option<Job> {
        self.read().jobs.get(key).map(|j| j.value.clone())
    }

    fn job_index(&self, key: &JobKey) -> Option<QueryIndex> {
        self.read().jobs.get(key).map(|j| j.index)
    }

    fn put_namespaces(&self, namespaces: Vec<Namespace>) {
        self.write().namespaces = namespaces;
    }

    fn namespaces(&self) -> Vec<Namespace> {
        self.read().namespaces.clone()
    }

    fn merge_checks(&self, allocation_id: &str, checks: AllocationChecks) {
        let mut inner = self.write();
        inner
            .checks
            .entry(allocation_id.to_string())
            .or_default()
            .merge(checks);
    }

    fn checks(&self, allocation_id: &str) -> Option<AllocationChecks> {
        self.read().checks.get(allocation_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use allocwatch_model::{CheckMode, CheckState, CheckStatus};

    use super::*;
    use crate::testing::{allocation, job};

    #[test]
    fn put_and_get_allocation() {
        let store = MemoryStore::new();
        store.put_allocation(Indexed::new(allocation("a1", "web"), 12));

        assert_eq!(store.allocation("a1").unwrap().job_id, "web");
        assert_eq!(store.allocation_index("a1"), Some(12));
        assert!(store.allocation("a2").is_none());
        assert_eq!(store.allocation_count(), 1);
    }

    #[test]
    fn newer_write_replaces_allocation_and_index() {
        let store = MemoryStore::new();
        store.put_allocation(Indexed::new(allocation("a1", "web"), 12));

        let mut updated = allocation("a1", "web");
        updated.client_status = "complete".into();
        store.put_allocation(Indexed::new(updated, 15));

        assert_eq!(store.allocation("a1").unwrap().client_status, "complete");
        assert_eq!(store.allocation_index("a1"), Some(15));
    }

    #[test]
    fn jobs_are_keyed_by_namespace() {
        let store = MemoryStore::new();
        store.put_job(Indexed::new(job("web", vec![]), 3));

        assert!(store.job(&JobKey::new("default", "web")).is_some());
        assert!(store.job(&JobKey::new("other", "web")).is_none());
        assert_eq!(store.job_index(&JobKey::new("default", "web")), Some(3));
    }

    #[test]
    fn namespaces_are_replaced_wholesale() {
        let store = MemoryStore::new();
        let ns = |name: &str| Namespace {
            name: name.into(),
            description: String::new(),
        };
        store.put_namespaces(vec![ns("default"), ns("prod")]);
        store.put_namespaces(vec![ns("default")]);
        assert_eq!(store.namespaces().len(), 1);
    }

    #[test]
    fn checks_merge_per_allocation() {
        let store = MemoryStore::new();
        let check = |id: &str, status| CheckStatus {
            id: id.into(),
            check: id.into(),
            group: "web".into(),
            task: String::new(),
            service: "web".into(),
            mode: CheckMode::Healthiness,
            status,
            status_code: 0,
            output: String::new(),
            timestamp: 1,
        };

        store.merge_checks("a1", [check("c1", CheckState::Pending)].into_iter().collect());
        store.merge_checks("a1", [check("c2", CheckState::Success)].into_iter().collect());

        let held = store.checks("a1").unwrap();
        assert_eq!(held.len(), 2);
        assert!(store.checks("a2").is_none());
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.put_allocation(Indexed::new(allocation("a1", "web"), 1));
        assert!(store.allocation("a1").is_some());
    }
}
