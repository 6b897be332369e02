use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Error types for network operations
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid peer address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Connection error: {0}")]
    ConnectionError(#[from] std::io::Error),

    #[error("Timeout error after {0:?}")]
    TimeoutError(std::time::Duration),
}

impl NetworkError {
    pub(crate) fn invalid<A: Into<String>, R: Into<String>>(addr: A, reason: R) -> Self {
        NetworkError::InvalidAddress {
            addr: addr.into(),
            reason: reason.into(),
        }
    }
}
