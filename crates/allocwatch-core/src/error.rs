use allocwatch_model::JobKey;
use thiserror::Error;

/// Failure of a single request against the orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("server error: {0}")]
    Server(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => "not_found",
            FetchError::Forbidden(_) => "forbidden",
            FetchError::Transport(_) => "transport",
            FetchError::InvalidResponse(_) => "invalid_response",
            FetchError::Server(_) => "server",
        }
    }
}

/// Failure to assemble an allocation view.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("allocation {id} could not be loaded: {source}")]
    Allocation {
        id: String,
        #[source]
        source: FetchError,
    },

    #[error("allocation {id} has no job reference")]
    MissingJob { id: String },

    #[error("job {key} could not be loaded: {source}")]
    Job {
        key: JobKey,
        #[source]
        source: FetchError,
    },

    #[error("namespaces could not be loaded: {source}")]
    Namespaces {
        #[source]
        source: FetchError,
    },
}

impl LoadError {
    /// Request failure behind this error, if any.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            LoadError::Allocation { source, .. }
            | LoadError::Job { source, .. }
            | LoadError::Namespaces { source } => Some(source),
            LoadError::MissingJob { .. } => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid watch config: {0}")]
    InvalidWatch(String),
}
