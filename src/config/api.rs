use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::schema::Schema;
use super::traits::ConfigObject;

static API_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "API",
    "description": "Config for the local HTTP API",
    "type": "object",
    "required": ["port"],
    "properties": {
      "port": {
        "description": "Port to listen on, 0 picks a free port",
        "type": "integer",
        "minimum": 0,
        "maximum": 65535
      },
      "read_only": {
        "description": "Reject requests that write to the repository",
        "type": "boolean"
      },
      "allowed_origins": {
        "description": "Origins allowed to make cross-origin requests",
        "type": "array",
        "items": { "type": "string" }
      }
    }
  }"#,
    )
});

/// Default port for the HTTP API.
pub const DEFAULT_API_PORT: u16 = 3000;

/// Configures the externally facing HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_API_PORT,
            read_only: false,
            allowed_origins: vec![format!("http://localhost:{}", DEFAULT_API_PORT)],
        }
    }
}

impl ConfigObject for ApiConfig {
    const NAME: &'static str = "api";

    fn schema() -> &'static Schema {
        &API_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_valid() {
        let cfg = ApiConfig::default();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn port_out_of_range() {
        let violations = ApiConfig::validate_record(&json!({"port": 70000}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "port");
    }

    #[test]
    fn origins_must_be_strings() {
        let violations =
            ApiConfig::validate_record(&json!({"port": 1, "allowed_origins": ["a", false]}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "allowed_origins[1]");
    }

    #[test]
    fn copy_does_not_share_origins() {
        let original = ApiConfig::default();
        let mut copy = original.copy();
        copy.allowed_origins.push("http://example.com".into());
        assert_eq!(original.allowed_origins.len(), 1);
        assert_eq!(copy.allowed_origins.len(), 2);
    }
}
