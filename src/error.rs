use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// True only when the remote platform answered with an explicit not-found.
    #[must_use]
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, Error::Remote(remote) if remote.is_not_found())
    }
}

/// Classified failure of a call to the remote platform.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote resource not found")]
    NotFound,

    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode remote response: {0}")]
    Decode(String),
}

impl RemoteError {
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 404 {
            RemoteError::NotFound
        } else {
            RemoteError::Status { status, body }
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound)
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::NotFound => Some(404),
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Transport(e) => e.status().map(|s| s.as_u16()),
            RemoteError::Decode(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
