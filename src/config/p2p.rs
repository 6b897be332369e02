use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::schema::Schema;
use super::traits::ConfigObject;

static P2P_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "P2P",
    "description": "Config for peer to peer networking",
    "type": "object",
    "required": ["enabled"],
    "properties": {
      "enabled": {
        "description": "When false the node runs offline and never dials peers",
        "type": "boolean"
      },
      "bootstrap_addrs": {
        "description": "Peers dialed at startup to join the network",
        "type": "array",
        "items": { "type": "string" }
      }
    }
  }"#,
    )
});

/// Bootstrap peers used when the configuration does not name any.
pub const DEFAULT_BOOTSTRAP_ADDRS: &[&str] = &[
    "/ip4/104.131.131.82/tcp/4001",
    "/ip4/104.236.179.241/tcp/4001",
    "/ip4/128.199.219.111/tcp/4001",
];

/// Configures peer to peer networking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2pConfig {
    pub enabled: bool,
    #[serde(default)]
    pub bootstrap_addrs: Vec<String>,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bootstrap_addrs: DEFAULT_BOOTSTRAP_ADDRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ConfigObject for P2pConfig {
    const NAME: &'static str = "p2p";

    fn schema() -> &'static Schema {
        &P2P_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_valid() {
        let cfg = P2pConfig::default();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.bootstrap_addrs.len(), DEFAULT_BOOTSTRAP_ADDRS.len());
    }

    #[test]
    fn missing_enabled() {
        let violations = P2pConfig::validate_record(&json!({"bootstrap_addrs": []}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "enabled");
    }

    #[test]
    fn record_holds_only_consumed_settings() {
        let record = serde_json::to_value(P2pConfig::default()).unwrap();
        let mut keys: Vec<&str> = record.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["bootstrap_addrs", "enabled"]);
    }

    #[test]
    fn copy_is_independent() {
        let mut original = P2pConfig::default();
        let copy = original.copy();
        original.bootstrap_addrs.clear();
        original.bootstrap_addrs.push("/ip4/10.0.0.1/tcp/1".into());
        assert_eq!(copy, P2pConfig::default());
    }
}
