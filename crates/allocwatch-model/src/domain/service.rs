use std::fmt;

use serde::{Deserialize, Serialize};

/// Subsystem responsible for registering a service and running its health checks.
///
/// The orchestrator emits the provider as a plain string; an empty string means
/// the default provider (`consul`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceProvider {
    /// Checks are run by the orchestrator itself.
    Nomad,
    /// Checks are delegated to an external service catalog.
    Consul,
    /// Any provider this model does not know about.
    Other(String),
}

impl ServiceProvider {
    /// Returns `true` when health checks for the service are run by the orchestrator.
    #[inline]
    pub fn is_orchestrator_managed(&self) -> bool {
        matches!(self, ServiceProvider::Nomad)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceProvider::Nomad => "nomad",
            ServiceProvider::Consul => "consul",
            ServiceProvider::Other(s) => s,
        }
    }
}

impl Default for ServiceProvider {
    fn default() -> Self {
        ServiceProvider::Consul
    }
}

impl From<String> for ServiceProvider {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "nomad" => ServiceProvider::Nomad,
            "" | "consul" => ServiceProvider::Consul,
            _ => ServiceProvider::Other(s),
        }
    }
}

impl From<&str> for ServiceProvider {
    fn from(s: &str) -> Self {
        ServiceProvider::from(s.to_string())
    }
}

impl From<ServiceProvider> for String {
    fn from(p: ServiceProvider) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service declaration attached to a task group or a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub provider: ServiceProvider,
    #[serde(default)]
    pub port_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Service {
    pub fn new(name: impl Into<String>, provider: impl Into<ServiceProvider>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            port_label: String::new(),
            tags: None,
        }
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}
