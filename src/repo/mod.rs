//! Repository handle and the bootstrap that produces it.
//!
//! * `backend` - backend selection, marker handling and the sled backend
//! * `bootstrap` - the one-shot state machine that binds a [`Repository`]
//! * `store` - content addressed block stores
//! * `profile` - the identity a repository presents
//! * `analytics` - optional usage event sink

pub mod analytics;
pub mod backend;
pub mod bootstrap;
pub mod error;
pub mod profile;
pub mod store;

pub use analytics::{AnalyticsSink, MemAnalytics};
pub use backend::{Backend, MarkerState, RepoMarker, SledBackend, StorageBackend, MARKER_FILE};
pub use bootstrap::{BootstrapOptions, BootstrapState, InitOutcome, RepositoryBootstrapper};
pub use error::{StorageError, StorageResult};
pub use profile::Profile;
pub use store::{content_key, BlockStore, MapStore, SledStore};

use std::fmt;
use std::sync::Arc;

/// A bound repository: one backend, one identity, for the whole run.
///
/// Cheap to clone; clones share the same block store. The backend cannot be
/// changed after construction.
#[derive(Clone)]
pub struct Repository {
    backend: Backend,
    store: Arc<dyn BlockStore>,
    profile: Profile,
    analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl Repository {
    pub fn new(
        backend: Backend,
        store: Arc<dyn BlockStore>,
        profile: Profile,
        analytics: Option<Arc<dyn AnalyticsSink>>,
    ) -> Self {
        Self {
            backend,
            store,
            profile,
            analytics,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn store(&self) -> &Arc<dyn BlockStore> {
        &self.store
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn analytics(&self) -> Option<&Arc<dyn AnalyticsSink>> {
        self.analytics.as_ref()
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("backend", &self.backend)
            .field("profile", &self.profile)
            .field("analytics", &self.analytics.is_some())
            .finish()
    }
}
