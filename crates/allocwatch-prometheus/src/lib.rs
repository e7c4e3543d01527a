//! Prometheus metrics backend for the allocation watch subsystem.
//!
//! [`PrometheusMetrics`] implements [`allocwatch_core::MetricsBackend`] on its own registry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use allocwatch_core::MetricsBackend;
//! use allocwatch_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let backend: Arc<dyn MetricsBackend> = Arc::new(metrics.clone());
//!
//! // Render the text exposition format:
//! let text = metrics.encode_text()?;
//! # let _ = (backend, text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `allocwatch_loads_total{outcome}` - Counter
//! - `allocwatch_polls_total{watcher, outcome}` - Counter
//! - `allocwatch_watchers_active{watcher}` - Gauge
//!
//! ## HTTP Server
//! This crate does NOT serve `/metrics`; hand [`PrometheusMetrics::gather`] to whatever
//! HTTP framework the application already runs.

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
