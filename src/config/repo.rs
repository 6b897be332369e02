use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::schema::Schema;
use super::traits::ConfigObject;

static REPO_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::must(
        r#"{
    "$schema": "http://json-schema.org/draft-06/schema#",
    "title": "Repo",
    "description": "Config for the repository",
    "type": "object",
    "required": ["type"],
    "properties": {
      "type": {
        "description": "Where repository state lives: on disk or only in memory",
        "type": "string",
        "enum": ["fs", "mem"]
      },
      "path": {
        "description": "Repository root for the fs type",
        "type": "string"
      }
    }
  }"#,
    )
});

/// Repository kind recorded in the `type` field when state lives on disk.
pub const REPO_TYPE_FS: &str = "fs";
/// Repository kind recorded in the `type` field for disposable in-memory runs.
pub const REPO_TYPE_MEM: &str = "mem";

/// Configures where the repository keeps its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            kind: REPO_TYPE_FS.to_string(),
            path: None,
        }
    }
}

impl RepoConfig {
    pub fn is_mem(&self) -> bool {
        self.kind == REPO_TYPE_MEM
    }
}

impl ConfigObject for RepoConfig {
    const NAME: &'static str = "repo";

    fn schema() -> &'static Schema {
        &REPO_SCHEMA
    }
}
