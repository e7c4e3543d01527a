use std::sync::{Arc, Mutex, MutexGuard};

use allocwatch_model::AllocationView;
use async_trait::async_trait;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::WatchConfig,
    error::ConfigError,
    loader::ModelLoader,
    metrics::MetricsBackend,
    notify::Notifier,
    predicate::needs_health_watch,
    store::ResourceStore,
    transport::ClusterApi,
    watch::{
        AllocationRecord, PollOperation, PollWatcher, RecordWatcher, ServiceHealthPoll,
        WatchHandle,
    },
};

/// Parameters the view framework passes to the hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub allocation_id: String,
}

impl ViewState {
    pub fn new(allocation_id: impl Into<String>) -> Self {
        Self {
            allocation_id: allocation_id.into(),
        }
    }
}

/// Enter/exit seam invoked by the view framework.
#[async_trait]
pub trait ViewHooks: Send + Sync {
    async fn enter(&self, state: &ViewState);
    async fn exit(&self, state: &ViewState);
}

/// One enter→exit span of the view.
struct Session {
    id: Uuid,
    token: CancellationToken,
    record: Option<WatchHandle>,
    poll: Option<WatchHandle>,
    view: Option<Arc<AllocationView>>,
}

impl Session {
    fn open() -> Self {
        Self {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
            record: None,
            poll: None,
            view: None,
        }
    }

    fn handles(&self) -> impl Iterator<Item = &WatchHandle> {
        self.record.iter().chain(self.poll.iter())
    }

    fn close(self) {
        for handle in self.handles() {
            handle.cancel();
        }
        self.token.cancel();
        info!(view_id = %self.id, "view session closed");
    }
}

/// Binds the watch loops of an allocation screen to its enter/exit events.
///
/// Entering loads the view, starts a record watcher on the allocation and, when
/// [`needs_health_watch`] says so, a health poll. Exiting cancels every loop of the session
/// and releases the loaded view. At most one session exists at a time.
pub struct WatchLifecycle {
    loader: ModelLoader,
    records: RecordWatcher,
    polls: PollWatcher,
    health: Arc<dyn PollOperation>,
    tracker: TaskTracker,
    session: Mutex<Option<Session>>,
}

impl WatchLifecycle {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        store: Arc<dyn ResourceStore>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<dyn MetricsBackend>,
        config: WatchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let health = Arc::new(ServiceHealthPoll::new(
            Arc::clone(&api),
            Arc::clone(&store),
        ));
        Ok(Self {
            loader: ModelLoader::new(
                Arc::clone(&api),
                Arc::clone(&store),
                notifier,
                Arc::clone(&metrics),
            ),
            polls: PollWatcher::new(Arc::clone(&metrics), config.health_interval()),
            records: RecordWatcher::new(api, store, metrics, config),
            health,
            tracker: TaskTracker::new(),
            session: Mutex::new(None),
        })
    }

    /// Enter the view: load it and start the watchers it needs.
    ///
    /// A session that is still open is closed first. Returns `None` when the load failed
    /// (the failure has already been notified) or the session was closed before the load
    /// finished; no watcher is started in either case.
    pub async fn start(&self, state: &ViewState) -> Option<Arc<AllocationView>> {
        let session = Session::open();
        let (view_id, token) = (session.id, session.token.clone());
        if let Some(previous) = self.lock().replace(session) {
            previous.close();
        }
        info!(view_id = %view_id, allocation = %state.allocation_id, "view session opened");

        let loaded = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            view = self.loader.load(&state.allocation_id) => view,
        };

        let mut guard = self.lock();
        let session = match guard.as_mut() {
            Some(s) if s.id == view_id && !token.is_cancelled() => s,
            _ => {
                debug!(view_id = %view_id, "view left before load finished");
                return None;
            }
        };
        let Some(view) = loaded.map(Arc::new) else {
            debug!(view_id = %view_id, "view not available; no watchers started");
            return None;
        };

        let record = self.records.start(
            AllocationRecord(view.allocation_id().to_string()),
            token.child_token(),
            &self.tracker,
        );
        info!(
            view_id = %view_id,
            watcher = %record.kind(),
            target = record.target(),
            "watcher started"
        );
        session.record = Some(record);

        if needs_health_watch(Some(&view)) {
            let poll = self.polls.start(
                Arc::clone(&view),
                Arc::clone(&self.health),
                token.child_token(),
                &self.tracker,
            );
            info!(
                view_id = %view_id,
                watcher = %poll.kind(),
                operation = self.health.name(),
                interval_ms = self.polls.interval().as_millis() as u64,
                "watcher started"
            );
            session.poll = Some(poll);
        }

        session.view = Some(Arc::clone(&view));
        Some(view)
    }

    /// Exit the view: cancel every handle of the session and release the view.
    ///
    /// Safe to call repeatedly or without a prior [`start`](Self::start).
    pub fn stop(&self) {
        if let Some(session) = self.lock().take() {
            session.close();
        }
    }

    /// [`stop`](Self::stop), then wait until every loop task has returned.
    pub async fn shutdown(&self) {
        self.stop();
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Handles held by the open session.
    pub fn watchers(&self) -> Vec<WatchHandle> {
        self.lock()
            .as_ref()
            .map(|s| s.handles().cloned().collect())
            .unwrap_or_default()
    }

    /// View loaded by the open session.
    pub fn aggregate(&self) -> Option<Arc<AllocationView>> {
        self.lock().as_ref().and_then(|s| s.view.clone())
    }

    /// Id of the open session, for correlating logs.
    pub fn session_id(&self) -> Option<Uuid> {
        self.lock().as_ref().map(|s| s.id)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ViewHooks for WatchLifecycle {
    async fn enter(&self, state: &ViewState) {
        self.start(state).await;
    }

    async fn exit(&self, _state: &ViewState) {
        self.stop();
    }
}
