use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Service;

/// Identity of a job: jobs are unique per namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub namespace: String,
    pub id: String,
}

impl JobKey {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.namespace)
    }
}

/// Job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub task_groups: Option<Vec<TaskGroup>>,
}

impl Job {
    pub fn key(&self) -> JobKey {
        JobKey::new(self.namespace.clone(), self.id.clone())
    }

    pub fn task_groups(&self) -> &[TaskGroup] {
        self.task_groups.as_deref().unwrap_or_default()
    }

    /// Find a task group definition by name.
    pub fn task_group(&self, name: &str) -> Option<&TaskGroup> {
        self.task_groups().iter().find(|g| g.name == name)
    }
}

pub(crate) fn default_namespace() -> String {
    "default".to_string()
}

/// Task group definition inside a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskGroup {
    pub name: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
    #[serde(default)]
    pub services: Option<Vec<Service>>,
}

impl TaskGroup {
    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_deref().unwrap_or_default()
    }

    pub fn services(&self) -> &[Service] {
        self.services.as_deref().unwrap_or_default()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks().iter().find(|t| t.name == name)
    }
}

/// Task definition inside a task group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub services: Option<Vec<Service>>,
}

impl Task {
    /// Declared services, or `None` when the task declares none at all.
    pub fn declared_services(&self) -> Option<&[Service]> {
        self.services.as_deref()
    }
}
