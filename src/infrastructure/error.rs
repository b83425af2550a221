use thiserror::Error;

/// Failure classes for the GitHub REST calls. Kept separate from
/// `InfraError` so the sync protocol can map each class to its own
/// user-facing message.
#[derive(Debug, Error)]
pub enum GitHubApiError {
    #[error("github rejected the credentials (http 401)")]
    Unauthorized,
    #[error("github denied the request (http 403)")]
    Forbidden,
    #[error("remote file changed since it was last read (http 409)")]
    Conflict,
    #[error("request timed out")]
    Timeout,
    #[error("github api error: http {status}; body={body}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid api payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
