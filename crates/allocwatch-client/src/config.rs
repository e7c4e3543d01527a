use std::time::Duration;

use crate::errors::ClientError;

/// Agent address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";

/// Environment variable overriding the agent address.
pub const ENV_ADDRESS: &str = "ALLOCWATCH_ADDR";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the orchestrator agent.
    pub address: String,
    /// Time allowed for a plain request; blocking reads get their wait added on top.
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Defaults, with the address taken from `ALLOCWATCH_ADDR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        match std::env::var(ENV_ADDRESS) {
            Ok(address) if !address.trim().is_empty() => config.address = address,
            _ => {}
        }
        config
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.address)
            .map_err(|e| ClientError::InvalidConfig(format!("address {:?}: {e}", self.address)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "address must be http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
