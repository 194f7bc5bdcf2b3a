use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Transport, authentication or HTTP status failure talking to the remote service.
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The remote payload is missing structure the client relies on.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Requested entity (usually a local artifact) was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Catch-all for storage-related failures we don't want to leak directly.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Configuration is invalid or refers to an unknown label.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteUnavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
