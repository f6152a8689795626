use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for restkit
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ResourceError {
    /// Status code of a non-2xx response, if this is one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResourceError>;
