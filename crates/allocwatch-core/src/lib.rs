//! Watch lifecycle for a single allocation screen.
//!
//! Entering the screen loads an [`AllocationView`](allocwatch_model::AllocationView),
//! starts a long-poll [`RecordWatcher`] on the allocation and, when any of its services
//! is health-checked by the orchestrator, a fixed-cadence [`PollWatcher`] on those checks.
//! Leaving the screen cancels every loop together.
//!
//! The crate talks to its collaborators only through traits:
//! - [`ClusterApi`]: network requests against the orchestrator,
//! - [`ResourceStore`]: identity-keyed cache the dashboard renders from,
//! - [`Notifier`]: user-visible, non-blocking notifications,
//! - [`MetricsBackend`]: counters and gauges.

pub mod config;
pub use config::{BackoffConfig, WatchConfig};

pub mod error;
pub use error::{ConfigError, FetchError, LoadError};

pub mod transport;
pub use transport::{ClusterApi, QueryOptions};

pub mod store;
pub use store::{MemoryStore, ResourceStore};

pub mod notify;
pub use notify::{ChannelNotifier, LogNotifier, Notice, Notifier, Severity};

pub mod metrics;
pub use metrics::{LoadOutcome, MetricsBackend, NoopMetrics, PollOutcome};

pub mod loader;
pub use loader::ModelLoader;

pub mod predicate;
pub use predicate::needs_health_watch;

pub mod watch;
pub use watch::{
    AllocationRecord, JobRecord, PollOperation, PollWatcher, RecordWatcher, ServiceHealthPoll,
    WatchHandle, WatchedRecord, WatcherKind,
};

pub mod lifecycle;
pub use lifecycle::{ViewHooks, ViewState, WatchLifecycle};

#[cfg(test)]
pub(crate) mod testing;
