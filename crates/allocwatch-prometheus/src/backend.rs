use allocwatch_core::{LoadOutcome, MetricsBackend, PollOutcome, WatcherKind};
use prometheus::{
    Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder, proto::MetricFamily,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Register(#[from] prometheus::Error),

    #[error("metrics output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// [`MetricsBackend`] recording into a Prometheus registry.
///
/// Clones share the same collectors.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    loads: IntCounterVec,
    polls: IntCounterVec,
    active: IntGaugeVec,
}

impl PrometheusMetrics {
    /// Backend on a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Backend registering its collectors into `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let loads = IntCounterVec::new(
            Opts::new("allocwatch_loads_total", "Allocation view loads by outcome"),
            &["outcome"],
        )?;
        let polls = IntCounterVec::new(
            Opts::new("allocwatch_polls_total", "Watch loop iterations by watcher and outcome"),
            &["watcher", "outcome"],
        )?;
        let active = IntGaugeVec::new(
            Opts::new("allocwatch_watchers_active", "Running watch loops by watcher"),
            &["watcher"],
        )?;

        registry.register(Box::new(loads.clone()))?;
        registry.register(Box::new(polls.clone()))?;
        registry.register(Box::new(active.clone()))?;

        Ok(Self {
            registry,
            loads,
            polls,
            active,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current metrics in the text exposition format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_load(&self, outcome: LoadOutcome) {
        self.loads.with_label_values(&[outcome.as_str()]).inc();
    }

    fn record_poll(&self, watcher: WatcherKind, outcome: PollOutcome) {
        self.polls
            .with_label_values(&[watcher.as_str(), outcome.as_str()])
            .inc();
    }

    fn watcher_started(&self, watcher: WatcherKind) {
        self.active.with_label_values(&[watcher.as_str()]).inc();
    }

    fn watcher_stopped(&self, watcher: WatcherKind) {
        self.active.with_label_values(&[watcher.as_str()]).dec();
    }
}
