use std::io;
use std::path::PathBuf;

/// Errors raised by the storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Creating the repository failed part way. Fatal for the run and never
    /// retried; the marker is only written last, so a rerun sees it absent.
    #[error("failed to initialize repository at {}: {source}", path.display())]
    Initialization {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The marker exists but cannot be trusted.
    #[error("repository marker at {} is corrupt: {reason}", path.display())]
    CorruptMarker { path: PathBuf, reason: String },

    /// The marker could not be read (permissions, not a directory, ...).
    #[error("cannot read repository marker at {}: {source}", path.display())]
    MarkerUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persistent repository was requested but none exists yet.
    #[error("no repository found at {}; rerun with --init-repo to create one", path.display())]
    NotInitialized { path: PathBuf },

    /// Errors from the block database
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// A lock guarding in-memory state was poisoned
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn init(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Initialization {
            path: path.into(),
            source,
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
