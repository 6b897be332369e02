//! Configuration module for the repository node
//!
//! Each configuration domain (store, repo, profile, api, p2p, logging) is a
//! plain serde struct implementing [`ConfigObject`]: it can build a valid
//! default, validate itself against an embedded [`Schema`], and deep copy
//! itself. [`Config`] composes the domains into the full node configuration.
//!
//! ```rust
//! use fold_repo::config::{Config, ConfigObject, StoreConfig};
//! use serde_json::json;
//!
//! assert!(StoreConfig::default().validate().is_empty());
//! assert_eq!(StoreConfig::validate_record(&json!({"type": "s3"})).len(), 1);
//!
//! let config = Config::default();
//! assert!(config.validate().is_empty());
//! ```

pub mod aggregate;
pub mod api;
pub mod error;
pub mod logging;
pub mod p2p;
pub mod profile;
pub mod repo;
pub mod schema;
pub mod store;
pub mod traits;
pub mod violation;

pub use aggregate::{domains, Config, ConfigOverrides};
pub use api::{ApiConfig, DEFAULT_API_PORT};
pub use error::{ConfigError, ConfigResult};
pub use logging::LoggingConfig;
pub use p2p::{P2pConfig, DEFAULT_BOOTSTRAP_ADDRS};
pub use profile::ProfileConfig;
pub use repo::{RepoConfig, REPO_TYPE_FS, REPO_TYPE_MEM};
pub use schema::{Schema, SchemaDefinitionError, SchemaType};
pub use store::StoreConfig;
pub use traits::{ConfigObject, ConfigSection, Domain};
pub use violation::{ValidationErrors, Violation};

/// Builds every built-in domain schema.
///
/// Call once at process start so a malformed schema definition aborts
/// startup instead of the first validation that happens to need it.
///
/// # Panics
///
/// Panics if any built-in schema definition is malformed.
pub fn check_schemas() {
    for domain in domains() {
        let schema = (domain.schema)();
        log::debug!(
            "Schema for '{}' ready ({})",
            domain.name,
            schema.title().unwrap_or("untitled")
        );
    }
}
