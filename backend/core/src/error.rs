use thiserror::Error;

/// Failure reported by a [`crate::storage::Storage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error(transparent)]
    Io(std::io::Error),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists,
            _ => StorageError::Io(err),
        }
    }
}

/// Top-level error type for the grid engine.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("malformed board: {0}")]
    MalformedBoard(&'static str),

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
