//! The `.foss_cli.toml` config file written by `foss-cli config`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".foss_cli.toml";

/// Contents of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub fossology: ServerConfig,
}

/// The `[fossology]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server_url: String,
    pub username: String,
    pub token: String,
}

impl CliConfig {
    /// Read the config file, `None` if it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file found");
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(server = %config.fossology.server_url, "Using config file");
        Ok(Some(config))
    }

    /// Write the config file, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
