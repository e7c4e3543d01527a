mod allocation;
pub use allocation::{Allocation, TaskEvent, TaskState};

mod job;
pub use job::{Job, JobKey, Task, TaskGroup};

mod service;
pub use service::{Service, ServiceProvider};

mod namespace;
pub use namespace::Namespace;

mod checks;
pub use checks::{AllocationChecks, CheckMode, CheckState, CheckStatus, ChecksSummary};

mod indexed;
pub use indexed::Indexed;

/// Allocation identifier as issued by the orchestrator.
pub type AllocationId = String;

/// Monotonic version index reported by the orchestrator for a response.
///
/// Echoed back on the next request to block until something newer exists.
pub type QueryIndex = u64;
