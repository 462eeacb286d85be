use thiserror::Error;

#[derive(Error, Debug)]
pub enum KanbanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KanbanError {
    pub fn remote_fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::RemoteFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Errors caused by the caller's request rather than by the server's environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }
}
