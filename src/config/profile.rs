use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::schema::Schema;
use super::traits::ConfigObject;

static PROFILE_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "Profile",
    "description": "The peer profile this node presents",
    "type": "object",
    "required": ["username"],
    "properties": {
      "username": { "type": "string" },
      "description": { "type": "string" }
    }
  }"#,
    )
});

/// Persisted identity settings for the node's peer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            username: "local".to_string(),
            description: None,
        }
    }
}

impl ConfigObject for ProfileConfig {
    const NAME: &'static str = "profile";

    fn schema() -> &'static Schema {
        &PROFILE_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_valid() {
        assert!(ProfileConfig::default().validate().is_empty());
    }

    #[test]
    fn username_must_be_a_string() {
        let violations = ProfileConfig::validate_record(&json!({"username": 12}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "username");
    }
}
