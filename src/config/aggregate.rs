use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::api::ApiConfig;
use super::error::{ConfigError, ConfigResult};
use super::logging::LoggingConfig;
use super::p2p::P2pConfig;
use super::profile::ProfileConfig;
use super::repo::{RepoConfig, REPO_TYPE_MEM};
use super::store::StoreConfig;
use super::traits::{ConfigObject, ConfigSection, Domain};
use super::violation::{ValidationErrors, Violation};

/// Every configuration domain the node recognizes.
pub fn domains() -> [Domain; 6] {
    [
        Domain::of::<StoreConfig>(),
        Domain::of::<RepoConfig>(),
        Domain::of::<ProfileConfig>(),
        Domain::of::<ApiConfig>(),
        Domain::of::<P2pConfig>(),
        Domain::of::<LoggingConfig>(),
    ]
}

/// Complete node configuration: one record per domain.
///
/// Persisted as a mapping from domain name to record. Domains missing from a
/// persisted file take their defaults; names that match no domain are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub repo: RepoConfig,
    pub profile: ProfileConfig,
    pub api: ApiConfig,
    pub p2p: P2pConfig,
    pub logging: LoggingConfig,
}

/// Values supplied on the command line that take precedence over the
/// persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub mem_only: bool,
    pub offline: bool,
    pub repo_path: Option<PathBuf>,
}

impl Config {
    fn sections(&self) -> [&dyn ConfigSection; 6] {
        [
            &self.store,
            &self.repo,
            &self.profile,
            &self.api,
            &self.p2p,
            &self.logging,
        ]
    }

    /// Validates every domain, collecting all violations.
    ///
    /// Each violation path is prefixed with its domain name. Nothing short
    /// circuits: two broken domains yield both sets of violations.
    pub fn validate(&self) -> Vec<Violation> {
        self.sections()
            .iter()
            .flat_map(|section| {
                let name = section.name();
                section.violations().into_iter().map(move |v| v.prefixed(name))
            })
            .collect()
    }

    /// Like [`validate`](Self::validate), as a `Result`.
    pub fn ensure_valid(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::check(self.validate())
    }

    /// Deep copy built from each domain's own copy.
    pub fn copy(&self) -> Config {
        Config {
            store: self.store.copy(),
            repo: self.repo.copy(),
            profile: self.profile.copy(),
            api: self.api.copy(),
            p2p: self.p2p.copy(),
            logging: self.logging.copy(),
        }
    }

    /// Builds a configuration from a decoded domain → record mapping.
    ///
    /// Every record is validated raw before deserialization and unknown
    /// domain names are reported, so the caller sees all problems at once.
    pub fn from_value(value: Value) -> ConfigResult<Config> {
        let records = match &value {
            Value::Object(records) => records,
            other => {
                let found = match other {
                    Value::Array(_) => "an array",
                    Value::Null => "null",
                    _ => "a scalar",
                };
                return Err(ValidationErrors::single(Violation::new(
                    "",
                    format!("expected a mapping of domain name to record, found {found}"),
                ))
                .into());
            }
        };

        let known = domains();
        let mut violations = Vec::new();
        for (name, record) in records {
            match known.iter().find(|domain| domain.name == name.as_str()) {
                Some(domain) => violations.extend(
                    (domain.validate_record)(record)
                        .into_iter()
                        .map(|v| v.prefixed(name)),
                ),
                None => {
                    violations.push(Violation::new(name.clone(), "unknown configuration domain"))
                }
            }
        }
        ValidationErrors::check(violations)?;

        Ok(serde_json::from_value(value)?)
    }

    /// Loads and validates a configuration file.
    ///
    /// `.toml` files are read as TOML, anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::not_found(path.display().to_string()),
            _ => ConfigError::Io(e),
        })?;

        let value: Value = if is_toml(path) {
            let table: toml::Value = toml::from_str(&text)?;
            serde_json::to_value(table)?
        } else {
            serde_json::from_str(&text)?
        };

        Config::from_value(value)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// A file that exists but is unreadable or invalid is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        match Config::load(path.as_ref()) {
            Err(ConfigError::NotFound(_)) => {
                info!(
                    "Config file {} not found, using default config",
                    path.as_ref().display()
                );
                Ok(Config::default())
            }
            other => other,
        }
    }

    /// Writes the configuration, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let text = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, text)?;
        Ok(())
    }

    /// Returns a copy with command line overrides applied.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Config {
        let mut merged = self.copy();
        if let Some(port) = overrides.port {
            merged.api.port = port;
        }
        if overrides.mem_only {
            merged.repo.kind = REPO_TYPE_MEM.to_string();
        }
        if overrides.offline {
            merged.p2p.enabled = false;
        }
        if let Some(path) = &overrides.repo_path {
            merged.repo.path = Some(path.clone());
        }
        merged
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_aggregate_is_valid() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn every_invalid_member_is_reported_with_its_name() {
        let mut cfg = Config::default();
        cfg.store.kind = "s3".into();
        cfg.repo.kind = "tape".into();

        let violations = cfg.validate();
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert_eq!(violations[0].path, "store.type");
        assert_eq!(violations[1].path, "repo.type");
    }

    #[test]
    fn copy_is_deep() {
        let mut original = Config::default();
        original.store.options.insert("nested".into(), json!({"a": [1, 2]}));
        let mut copy = original.copy();
        assert_eq!(copy, original);

        copy.store.options.get_mut("nested").unwrap()["a"] = json!([3]);
        copy.p2p.bootstrap_addrs.clear();
        assert_eq!(original.store.options["nested"], json!({"a": [1, 2]}));
        assert!(!original.p2p.bootstrap_addrs.is_empty());
    }

    #[test]
    fn from_value_collects_all_problems() {
        let err = Config::from_value(json!({
            "store": {},
            "api": {"port": "http"},
            "webapp": {"enabled": true}
        }))
        .unwrap_err();

        let violations = err.violations().expect("validation error").violations().to_vec();
        let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(paths.contains(&"store.type"));
        assert!(paths.contains(&"api.port"));
        assert!(paths.contains(&"webapp"));
    }

    #[test]
    fn whole_float_port_is_a_violation_not_a_parse_error() {
        let err = Config::from_value(json!({"api": {"port": 3000.0}})).unwrap_err();
        let violations = err.violations().expect("validation error").violations().to_vec();
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert_eq!(violations[0].path, "api.port");
    }

    #[test]
    fn retired_p2p_keys_still_load() {
        let cfg = Config::from_value(json!({
            "p2p": {"enabled": false, "listen_addr": "/ip4/0.0.0.0/tcp/0"}
        }))
        .unwrap();
        assert!(!cfg.p2p.enabled);
        assert!(serde_json::to_value(&cfg).unwrap()["p2p"].get("listen_addr").is_none());
    }

    #[test]
    fn from_value_fills_missing_domains() {
        let cfg = Config::from_value(json!({
            "store": {"type": "ipfs"},
            "profile": {"username": "b5"}
        }))
        .unwrap();
        assert_eq!(cfg.profile.username, "b5");
        assert_eq!(cfg.api, ApiConfig::default());
    }

    #[test]
    fn from_value_rejects_non_mapping() {
        let err = Config::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.violations().map(|v| v.len()), Some(1));
    }

    #[test]
    fn overrides_take_precedence() {
        let cfg = Config::default().with_overrides(&ConfigOverrides {
            port: Some(4000),
            mem_only: true,
            offline: true,
            repo_path: Some(PathBuf::from("/tmp/repo")),
        });
        assert_eq!(cfg.api.port, 4000);
        assert!(cfg.repo.is_mem());
        assert!(!cfg.p2p.enabled);
        assert_eq!(cfg.repo.path, Some(PathBuf::from("/tmp/repo")));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn overrides_do_not_touch_source() {
        let base = Config::default();
        let _ = base.with_overrides(&ConfigOverrides {
            offline: true,
            ..Default::default()
        });
        assert!(base.p2p.enabled);
    }
}
