use serde::{Deserialize, Serialize};

use crate::config::ProfileConfig;

/// Identity a bound repository presents to peers and API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub peer_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Profile {
    pub const PLACEHOLDER_USERNAME: &'static str = "mem user";
    pub const PLACEHOLDER_PEER_ID: &'static str = "mem";

    /// Fixed identity for memory-only runs; nothing is read from disk.
    pub fn placeholder() -> Self {
        Self {
            peer_id: Self::PLACEHOLDER_PEER_ID.to_string(),
            username: Self::PLACEHOLDER_USERNAME.to_string(),
            description: None,
        }
    }

    /// Identity of a persistent repository: the configured profile plus the
    /// peer id recorded when the repository was created.
    pub fn from_config(config: &ProfileConfig, peer_id: &str) -> Self {
        Self {
            peer_id: peer_id.to_string(),
            username: config.username.clone(),
            description: config.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_fixed() {
        assert_eq!(Profile::placeholder(), Profile::placeholder());
        assert_eq!(Profile::placeholder().username, "mem user");
    }

    #[test]
    fn from_config_copies_fields() {
        let mut cfg = ProfileConfig::default();
        cfg.description = Some("archive node".into());
        let profile = Profile::from_config(&cfg, "peer-1");
        cfg.username = "changed".into();
        assert_eq!(profile.username, "local");
        assert_eq!(profile.peer_id, "peer-1");
        assert_eq!(profile.description.as_deref(), Some("archive node"));
    }
}
