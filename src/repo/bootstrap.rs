//! One-shot repository bootstrap.
//!
//! A [`RepositoryBootstrapper`] turns a validated [`Config`] into a bound
//! [`Repository`]. It moves through [`BootstrapState`] exactly once:
//!
//! ```text
//! Unresolved -> PersistentStorageChecked -> Initialized | AlreadyPresent -> Bound
//! Unresolved -> MemoryBound -> Bound
//! ```

use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

use super::analytics::{AnalyticsSink, MemAnalytics};
use super::backend::{Backend, MarkerState, RepoMarker, SledBackend, StorageBackend};
use super::error::StorageError;
use super::profile::Profile;
use super::Repository;
use crate::config::{Config, StoreConfig};
use crate::error::{RepoError, RepoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Unresolved,
    PersistentStorageChecked,
    Initialized,
    AlreadyPresent,
    MemoryBound,
    Bound,
}

/// What [`RepositoryBootstrapper::init_if_absent`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Create the persistent repository when its marker is absent.
    pub init_if_absent: bool,
}

pub struct RepositoryBootstrapper {
    backend: Arc<dyn StorageBackend>,
    state: BootstrapState,
}

impl Default for RepositoryBootstrapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryBootstrapper {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(SledBackend))
    }

    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            state: BootstrapState::Unresolved,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Decides where the repository lives. Pure: looks only at `config`.
    pub fn resolve_backend(config: &Config) -> RepoResult<Backend> {
        if config.repo.is_mem() {
            return Ok(Backend::Memory);
        }
        config
            .repo
            .path
            .clone()
            .map(Backend::Persistent)
            .ok_or(RepoError::MissingRepoPath)
    }

    /// Creates a repository under `path` unless one is already there.
    ///
    /// Calling this any number of times for the same location writes the
    /// initial state at most once.
    pub fn init_if_absent(&mut self, path: &Path, store: &StoreConfig) -> RepoResult<InitOutcome> {
        if self.state == BootstrapState::Bound {
            return Ok(InitOutcome::AlreadyPresent);
        }

        let marker_state = self.backend.marker_state(path)?;
        self.state = BootstrapState::PersistentStorageChecked;

        match marker_state {
            MarkerState::Present(marker) => {
                debug!(
                    "Repository at {} already initialized (peer id {})",
                    path.display(),
                    marker.peer_id
                );
                self.state = BootstrapState::AlreadyPresent;
                Ok(InitOutcome::AlreadyPresent)
            }
            MarkerState::Absent => {
                self.backend.initialize(path, &RepoMarker::new(store), store)?;
                self.state = BootstrapState::Initialized;
                Ok(InitOutcome::Initialized)
            }
        }
    }

    /// Validates `config` and binds a repository according to it.
    ///
    /// Memory-only configurations never touch the filesystem. A bootstrapper
    /// binds at most once.
    pub fn bootstrap(
        &mut self,
        config: &Config,
        options: &BootstrapOptions,
    ) -> RepoResult<Repository> {
        if self.state == BootstrapState::Bound {
            return Err(RepoError::AlreadyBound);
        }
        config.ensure_valid()?;

        let backend = Self::resolve_backend(config)?;
        let repo = match &backend {
            Backend::Memory => {
                self.state = BootstrapState::MemoryBound;
                let analytics: Arc<dyn AnalyticsSink> = Arc::new(MemAnalytics::new());
                Repository::new(
                    backend.clone(),
                    self.backend.empty(),
                    Profile::placeholder(),
                    Some(analytics),
                )
            }
            Backend::Persistent(path) => {
                if options.init_if_absent {
                    self.init_if_absent(path, &config.store)?;
                }
                let marker = match self.backend.marker_state(path)? {
                    MarkerState::Present(marker) => marker,
                    MarkerState::Absent => {
                        return Err(StorageError::NotInitialized { path: path.clone() }.into())
                    }
                };
                let store = self.backend.open(path, &config.store)?;
                Repository::new(
                    backend.clone(),
                    store,
                    Profile::from_config(&config.profile, &marker.peer_id),
                    None,
                )
            }
        };

        self.state = BootstrapState::Bound;
        info!(
            "Bound {} repository as '{}' ({})",
            backend.label(),
            repo.profile().username,
            repo.profile().peer_id
        );
        Ok(repo)
    }
}
