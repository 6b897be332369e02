//! Top level error type for the repository node.

use crate::api::ServiceStartError;
use crate::config::{ConfigError, ValidationErrors};
use crate::repo::StorageError;

/// Unified error type for bootstrapping and serving a repository.
///
/// Each layer keeps its own error enum; this wraps them so the binary can
/// report any failure with one `?`.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Errors related to configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors from the storage collaborator
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Errors starting the API service
    #[error(transparent)]
    Service(#[from] ServiceStartError),

    /// A bootstrapper that already bound a repository was asked to bind again
    #[error("repository is already bound; the backend cannot change during a run")]
    AlreadyBound,

    /// A persistent repository was requested without a location
    #[error("repo.path must be set when repo.type is 'fs'")]
    MissingRepoPath,
}

impl From<ValidationErrors> for RepoError {
    fn from(errors: ValidationErrors) -> Self {
        RepoError::Config(ConfigError::Validation(errors))
    }
}

/// Result type alias for repository node operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Violation;

    #[test]
    fn validation_errors_become_config_errors() {
        let violation = Violation::new("api.port", "expected integer, found string");
        let errors = ValidationErrors::single(violation);
        let err: RepoError = errors.into();
        match &err {
            RepoError::Config(config) => assert_eq!(config.violations().map(|v| v.len()), Some(1)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("api.port"));
    }
}
