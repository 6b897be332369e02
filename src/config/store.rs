use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::schema::Schema;
use super::traits::ConfigObject;

static STORE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "Store",
    "description": "Config for the content addressed block store",
    "type": "object",
    "required": ["type"],
    "properties": {
      "type": {
        "description": "Type of store",
        "type": "string",
        "enum": ["ipfs"]
      },
      "options": {
        "description": "Backend tuning; unrecognized keys are passed through untouched",
        "type": "object",
        "properties": {
          "cache_capacity": { "type": "integer", "minimum": 0 },
          "flush_every_ms": { "type": "integer", "minimum": 0 }
        }
      }
    }
  }"#,
    )
});

/// Configures the content addressed block store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: "ipfs".to_string(),
            options: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    /// Cache size hint for the block database, in bytes.
    pub fn cache_capacity(&self) -> Option<u64> {
        self.options.get("cache_capacity").and_then(|v| v.as_u64())
    }

    /// Background flush interval for the block database, in milliseconds.
    pub fn flush_every_ms(&self) -> Option<u64> {
        self.options.get("flush_every_ms").and_then(|v| v.as_u64())
    }
}

impl ConfigObject for StoreConfig {
    const NAME: &'static str = "store";

    fn schema() -> &'static Schema {
        &STORE_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_valid() {
        assert!(StoreConfig::default().validate().is_empty());
    }

    #[test]
    fn ipfs_record_is_valid() {
        assert!(StoreConfig::validate_record(&json!({"type": "ipfs"})).is_empty());
    }

    #[test]
    fn unsupported_type_is_one_enum_violation() {
        let violations = StoreConfig::validate_record(&json!({"type": "s3"}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "type");
        assert!(violations[0].message.contains("not one of"));
    }

    #[test]
    fn missing_type_is_one_required_violation() {
        let violations = StoreConfig::validate_record(&json!({}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "type");
        assert!(violations[0].message.contains("required"));
    }

    #[test]
    fn tuning_options_are_checked() {
        let violations = StoreConfig::validate_record(&json!({
            "type": "ipfs",
            "options": {"cache_capacity": -1, "flush_every_ms": 500, "custom": "kept"}
        }));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "options.cache_capacity");
    }

    #[test]
    fn tuning_accessors() {
        let mut cfg = StoreConfig::default();
        assert_eq!(cfg.cache_capacity(), None);
        cfg.options.insert("cache_capacity".into(), json!(1024));
        assert_eq!(cfg.cache_capacity(), Some(1024));
    }

    #[test]
    fn copy_is_independent() {
        let mut original = StoreConfig::default();
        original.options.insert("nested".into(), json!({"depth": 1}));

        let mut copy = original.copy();
        assert_eq!(copy, original);

        copy.options.insert("nested".into(), json!({"depth": 2}));
        copy.kind = "other".into();
        assert_eq!(original.options["nested"], json!({"depth": 1}));
        assert_eq!(original.kind, "ipfs");

        original.options.clear();
        assert_eq!(copy.options.len(), 1);
    }

    #[test]
    fn defaults_share_nothing() {
        let mut a = StoreConfig::default();
        let b = StoreConfig::default();
        a.options.insert("k".into(), json!(1));
        assert!(b.options.is_empty());
    }
}
