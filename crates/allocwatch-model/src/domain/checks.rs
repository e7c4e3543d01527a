use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome of the latest run of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Success,
    Failure,
    Pending,
    #[serde(other)]
    Unknown,
}

/// Whether a check gates readiness or reports healthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    Healthiness,
    Readiness,
    #[serde(other)]
    Unknown,
}

/// Latest result of one orchestrator-run service health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub check: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub service: String,
    pub mode: CheckMode,
    pub status: CheckState,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub output: String,
    /// Unix time in seconds.
    #[serde(default)]
    pub timestamp: i64,
}

/// Health check results of one allocation keyed by check id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationChecks(pub BTreeMap<String, CheckStatus>);

impl AllocationChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CheckStatus> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckStatus> {
        self.0.values()
    }

    /// Upsert every check of `newer`; checks absent from `newer` are kept.
    ///
    /// A result older than the one already held is ignored.
    pub fn merge(&mut self, newer: AllocationChecks) {
        for (id, status) in newer.0 {
            match self.0.get(&id) {
                Some(held) if held.timestamp > status.timestamp => {}
                _ => {
                    self.0.insert(id, status);
                }
            }
        }
    }

    pub fn summary(&self) -> ChecksSummary {
        self.iter().fold(ChecksSummary::default(), |mut acc, c| {
            match c.status {
                CheckState::Success => acc.success += 1,
                CheckState::Failure => acc.failure += 1,
                CheckState::Pending | CheckState::Unknown => acc.pending += 1,
            }
            acc
        })
    }
}

impl FromIterator<CheckStatus> for AllocationChecks {
    fn from_iter<I: IntoIterator<Item = CheckStatus>>(iter: I) -> Self {
        Self(iter.into_iter().map(|c| (c.id.clone(), c)).collect())
    }
}

/// Count of checks per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecksSummary {
    pub success: usize,
    pub failure: usize,
    pub pending: usize,
}

impl ChecksSummary {
    pub fn total(&self) -> usize {
        self.success + self.failure + self.pending
    }

    pub fn is_healthy(&self) -> bool {
        self.failure == 0 && self.pending == 0
    }
}
