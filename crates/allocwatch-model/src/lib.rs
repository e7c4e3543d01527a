//! Data model of the orchestrator resources an allocation view is built from.
//!
//! Types mirror the JSON the orchestrator HTTP API emits (PascalCase keys, `null` for empty lists).
//! Accessors never fail on absent nested data: missing lists read as empty slices
//! and unresolvable references read as `None`.

mod domain;
pub use domain::*;

mod view;
pub use view::AllocationView;
