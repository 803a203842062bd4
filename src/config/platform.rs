//! Target forge identifier.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Forge flavours the coordinator can talk to.
///
/// Forgejo and Gitea share the same REST v1 API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Forgejo,
    Gitea,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Forgejo => "forgejo",
            Platform::Gitea => "gitea",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forgejo" => Ok(Platform::Forgejo),
            "gitea" => Ok(Platform::Gitea),
            other => Err(format!("unsupported platform: {}", other)),
        }
    }
}
