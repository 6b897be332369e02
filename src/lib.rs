//! # Fold Repo Library
//!
//! Configuration validation and service bootstrap for a content addressed,
//! peer replicated repository node.
//!
//! ## Core Components
//!
//! * `config` - Schema checked configuration domains and their aggregate
//! * `repo` - Repository bootstrap, storage backends and block stores
//! * `api` - Local HTTP API and service startup
//! * `network` - Bootstrap peer address parsing and dialing
//! * `logging` - Logger setup from the `logging` domain
//! * `error` - Error types and handling
//!
//! ## Architecture
//!
//! A run loads the persisted [`Config`], applies command line overrides and
//! validates every domain, reporting all violations at once. The
//! [`RepositoryBootstrapper`] then binds a [`Repository`], either in memory or
//! on disk (creating it on first use when asked to), and [`ApiServer`] serves
//! it while dialing bootstrap peers unless running offline.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod repo;

// Re-export main types for convenience
pub use api::{ApiOptions, ApiServer, ServiceStartError};
pub use config::{Config, ConfigError, ConfigObject, ConfigOverrides, ValidationErrors, Violation};
pub use error::{RepoError, RepoResult};
pub use repo::{BootstrapOptions, Repository, RepositoryBootstrapper, StorageError};
