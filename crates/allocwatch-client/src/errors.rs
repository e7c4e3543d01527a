use allocwatch_core::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid client config: {0}")]
    InvalidConfig(String),
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => FetchError::InvalidResponse(e.to_string()),
            ClientError::Http(e) => FetchError::Transport(e.to_string()),
            ClientError::NotFound(body) => FetchError::NotFound(body),
            ClientError::Forbidden(body) => FetchError::Forbidden(body),
            e @ ClientError::Status { .. } => FetchError::Server(e.to_string()),
            ClientError::InvalidResponse(msg) => FetchError::InvalidResponse(msg),
            ClientError::InvalidConfig(msg) => FetchError::Transport(msg),
        }
    }
}
