use crate::{Allocation, Job, Namespace, Service, TaskGroup};

/// Aggregate rendered by the allocation screen: the allocation plus the dependencies it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationView {
    pub allocation: Allocation,
    /// Owning job as loaded alongside the allocation.
    pub job: Job,
    pub namespaces: Vec<Namespace>,
}

impl AllocationView {
    pub fn new(allocation: Allocation, job: Job, namespaces: Vec<Namespace>) -> Self {
        Self {
            allocation,
            job,
            namespaces,
        }
    }

    pub fn allocation_id(&self) -> &str {
        &self.allocation.id
    }

    /// Task group definition of the allocation.
    ///
    /// Resolved against the loaded job first, then against the job snapshot embedded
    /// in the allocation. `None` when neither defines the group.
    pub fn task_group(&self) -> Option<&TaskGroup> {
        let name = self.allocation.task_group.as_str();
        self.job.task_group(name).or_else(|| {
            self.allocation
                .job
                .as_ref()
                .and_then(|snapshot| snapshot.task_group(name))
        })
    }

    /// Services declared on the task group; empty when the group is unknown.
    pub fn group_services(&self) -> &[Service] {
        self.task_group().map(TaskGroup::services).unwrap_or_default()
    }

    /// Services declared by the tasks that have a runtime state in this allocation.
    ///
    /// Tasks without a definition or without declared services are skipped.
    pub fn task_services(&self) -> impl Iterator<Item = &Service> {
        let group = self.task_group();
        self.allocation
            .task_states()
            .filter_map(move |(name, _)| group?.task(name)?.declared_services())
            .flatten()
    }
}
