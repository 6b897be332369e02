use std::io;

/// Errors raised while starting or running the API service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceStartError {
    /// An option was rejected before any socket was opened
    #[error("invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    /// The listener could not be bound
    #[error("failed to bind API server to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an error after starting
    #[error("API server error: {0}")]
    Server(#[from] io::Error),
}

impl ServiceStartError {
    pub(crate) fn invalid_option<O: Into<String>, R: ToString>(option: O, reason: R) -> Self {
        ServiceStartError::InvalidOption {
            option: option.into(),
            reason: reason.to_string(),
        }
    }
}
