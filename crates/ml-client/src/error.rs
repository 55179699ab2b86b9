use thiserror::Error;

#[derive(Error, Debug)]
pub enum MLError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MLError {
    /// Map a reqwest failure, keeping client-side timeouts distinct.
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MLError::Timeout
        } else {
            MLError::RequestFailed(err)
        }
    }
}

pub type MLResult<T> = Result<T, MLError>;
