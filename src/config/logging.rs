use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::Schema;
use super::traits::ConfigObject;

static LOGGING_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "Logging",
    "description": "Log levels for the node and its subsystems",
    "type": "object",
    "required": ["level"],
    "properties": {
      "level": {
        "type": "string",
        "enum": ["trace", "debug", "info", "warn", "error", "off"]
      },
      "features": {
        "description": "Per-module overrides, keyed by module path",
        "type": "object",
        "additionalProperties": {
          "type": "string",
          "enum": ["trace", "debug", "info", "warn", "error", "off"]
        }
      }
    }
  }"#,
    )
});

/// Configures log verbosity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            features: BTreeMap::new(),
        }
    }
}

impl ConfigObject for LoggingConfig {
    const NAME: &'static str = "logging";

    fn schema() -> &'static Schema {
        &LOGGING_SCHEMA
    }
}
