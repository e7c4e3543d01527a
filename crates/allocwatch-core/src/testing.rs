//! Fixtures and a scripted [`ClusterApi`] for unit tests.

use std::{
    collections::BTreeMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use allocwatch_model::{
    Allocation, AllocationChecks, AllocationView, Indexed, Job, JobKey, Namespace, Service, Task,
    TaskGroup, TaskState,
};
use async_trait::async_trait;

use crate::{
    error::FetchError,
    notify::{Notice, Notifier},
    transport::{ClusterApi, QueryOptions},
};

pub(crate) const GROUP: &str = "web";

pub(crate) fn allocation(id: &str, job_id: &str) -> Allocation {
    Allocation {
        id: id.into(),
        name: format!("{job_id}.{GROUP}[0]"),
        namespace: "default".into(),
        node_id: "node-1".into(),
        job_id: job_id.into(),
        task_group: GROUP.into(),
        client_status: "running".into(),
        desired_status: "run".into(),
        task_states: None,
        job: None,
        create_index: 1,
        modify_index: 1,
    }
}

pub(crate) fn with_tasks(mut alloc: Allocation, tasks: &[&str]) -> Allocation {
    let states: BTreeMap<String, TaskState> = tasks
        .iter()
        .map(|t| (t.to_string(), TaskState::default()))
        .collect();
    alloc.task_states = Some(states);
    alloc
}

pub(crate) fn job(id: &str, groups: Vec<TaskGroup>) -> Job {
    Job {
        id: id.into(),
        name: id.into(),
        namespace: "default".into(),
        r#type: "service".into(),
        status: "running".into(),
        version: 1,
        task_groups: Some(groups),
    }
}

pub(crate) fn group(services: Option<Vec<Service>>, tasks: Vec<Task>) -> TaskGroup {
    TaskGroup {
        name: GROUP.into(),
        count: 1,
        tasks: Some(tasks),
        services,
    }
}

pub(crate) fn task(name: &str, services: Option<Vec<Service>>) -> Task {
    Task {
        name: name.into(),
        driver: "docker".into(),
        services,
    }
}

pub(crate) fn svc(provider: &str) -> Service {
    Service::new(format!("{provider}-svc"), provider)
}

/// View whose task group declares one orchestrator-checked service.
pub(crate) fn nomad_view() -> AllocationView {
    AllocationView::new(
        allocation("alloc-1", "app"),
        job("app", vec![group(Some(vec![svc("nomad")]), vec![])]),
        vec![],
    )
}

/// View without any orchestrator-checked service.
pub(crate) fn plain_view() -> AllocationView {
    AllocationView::new(
        allocation("alloc-1", "app"),
        job("app", vec![group(Some(vec![svc("consul")]), vec![])]),
        vec![],
    )
}

/// Scripted orchestrator.
///
/// Blocking allocation reads hold for the requested wait when the stored index is not newer
/// than the requested one, as the real server does.
pub(crate) struct FakeApi {
    allocation: Mutex<Result<Indexed<Allocation>, FetchError>>,
    job: Mutex<Result<Indexed<Job>, FetchError>>,
    namespaces: Mutex<Result<Vec<Namespace>, FetchError>>,
    checks: Mutex<Result<AllocationChecks, FetchError>>,
    /// Number of upcoming blocking allocation reads that fail.
    failing_watches: AtomicUsize,
    /// Blocking allocation reads answer at once with a bumped index.
    always_newer: AtomicBool,
    load_delay: Mutex<Duration>,
    dependency_delay: Mutex<Duration>,

    pub allocation_calls: AtomicUsize,
    pub job_calls: AtomicUsize,
    pub namespace_calls: AtomicUsize,
    pub checks_calls: AtomicUsize,
    pub allocation_queries: Mutex<Vec<QueryOptions>>,
}

impl FakeApi {
    pub fn serving(view: &AllocationView) -> Arc<Self> {
        Arc::new(Self {
            allocation: Mutex::new(Ok(Indexed::new(view.allocation.clone(), 10))),
            job: Mutex::new(Ok(Indexed::new(view.job.clone(), 5))),
            namespaces: Mutex::new(Ok(vec![Namespace {
                name: "default".into(),
                description: String::new(),
            }])),
            checks: Mutex::new(Ok(AllocationChecks::new())),
            failing_watches: AtomicUsize::new(0),
            always_newer: AtomicBool::new(false),
            load_delay: Mutex::new(Duration::ZERO),
            dependency_delay: Mutex::new(Duration::ZERO),
            allocation_calls: AtomicUsize::new(0),
            job_calls: AtomicUsize::new(0),
            namespace_calls: AtomicUsize::new(0),
            checks_calls: AtomicUsize::new(0),
            allocation_queries: Mutex::new(Vec::new()),
        })
    }

    pub fn set_allocation(&self, result: Result<Indexed<Allocation>, FetchError>) {
        *self.allocation.lock().unwrap() = result;
    }

    pub fn set_job(&self, result: Result<Indexed<Job>, FetchError>) {
        *self.job.lock().unwrap() = result;
    }

    pub fn set_namespaces(&self, result: Result<Vec<Namespace>, FetchError>) {
        *self.namespaces.lock().unwrap() = result;
    }

    pub fn set_checks(&self, result: Result<AllocationChecks, FetchError>) {
        *self.checks.lock().unwrap() = result;
    }

    pub fn fail_next_watches(&self, n: usize) {
        self.failing_watches.store(n, Ordering::SeqCst);
    }

    pub fn set_always_newer(&self, on: bool) {
        self.always_newer.store(on, Ordering::SeqCst);
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = delay;
    }

    pub fn set_dependency_delay(&self, delay: Duration) {
        *self.dependency_delay.lock().unwrap() = delay;
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClusterApi for FakeApi {
    async fn allocation(
        &self,
        _id: &str,
        query: &QueryOptions,
    ) -> Result<Indexed<Allocation>, FetchError> {
        self.allocation_calls.fetch_add(1, Ordering::SeqCst);
        self.allocation_queries.lock().unwrap().push(*query);

        let Some(index) = query.index else {
            let delay = *self.load_delay.lock().unwrap();
            tokio::time::sleep(delay).await;
            return self.allocation.lock().unwrap().clone();
        };

        let failing = self.failing_watches.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_watches.store(failing - 1, Ordering::SeqCst);
            return Err(FetchError::Transport("connection reset".into()));
        }

        let current = self.allocation.lock().unwrap().clone();
        if self.always_newer.load(Ordering::SeqCst) {
            return current.map(|c| Indexed::new(c.value, index + 1));
        }
        hold_unless_newer(&current, index, query).await;
        current
    }

    async fn job(&self, _key: &JobKey, query: &QueryOptions) -> Result<Indexed<Job>, FetchError> {
        self.job_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.job.lock().unwrap().clone();
        match query.index {
            Some(index) => hold_unless_newer(&current, index, query).await,
            None => {
                let delay = *self.dependency_delay.lock().unwrap();
                tokio::time::sleep(delay).await;
            }
        }
        current
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>, FetchError> {
        self.namespace_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.dependency_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        self.namespaces.lock().unwrap().clone()
    }

    async fn allocation_checks(&self, _id: &str) -> Result<AllocationChecks, FetchError> {
        self.checks_calls.fetch_add(1, Ordering::SeqCst);
        self.checks.lock().unwrap().clone()
    }
}

async fn hold_unless_newer<T>(
    current: &Result<Indexed<T>, FetchError>,
    index: u64,
    query: &QueryOptions,
) {
    if matches!(current, Ok(c) if c.index <= index) {
        tokio::time::sleep(query.wait.unwrap_or(Duration::from_secs(300))).await;
    }
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
