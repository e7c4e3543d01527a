use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::job::default_namespace;
use crate::{AllocationId, Job, JobKey, QueryIndex};

/// Placement of one task group of a job onto a client node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Allocation {
    #[serde(rename = "ID")]
    pub id: AllocationId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(rename = "JobID", default)]
    pub job_id: String,
    /// Name of the task group this allocation runs; the definition lives in the job.
    #[serde(default)]
    pub task_group: String,
    #[serde(default)]
    pub client_status: String,
    #[serde(default)]
    pub desired_status: String,
    /// Runtime state per task name.
    #[serde(default)]
    pub task_states: Option<BTreeMap<String, TaskState>>,
    /// Snapshot of the job the allocation was placed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    #[serde(default)]
    pub create_index: QueryIndex,
    #[serde(default)]
    pub modify_index: QueryIndex,
}

impl Allocation {
    /// Identity of the owning job, or `None` when the allocation carries no job reference.
    pub fn job_key(&self) -> Option<JobKey> {
        if self.job_id.trim().is_empty() {
            return None;
        }
        Some(JobKey::new(self.namespace.clone(), self.job_id.clone()))
    }

    /// Task states ordered by task name.
    pub fn task_states(&self) -> impl Iterator<Item = (&str, &TaskState)> {
        self.task_states
            .iter()
            .flatten()
            .map(|(name, state)| (name.as_str(), state))
    }

    /// Short form of the id, as shown in listings.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// Runtime state of one task inside an allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskState {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub restarts: u64,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<TaskEvent>>,
}

impl TaskState {
    pub fn events(&self) -> &[TaskEvent] {
        self.events.as_deref().unwrap_or_default()
    }

    pub fn last_event(&self) -> Option<&TaskEvent> {
        self.events().last()
    }
}

/// Entry of a task's event history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskEvent {
    #[serde(default)]
    pub r#type: String,
    /// Unix time in nanoseconds.
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub display_message: String,
}
