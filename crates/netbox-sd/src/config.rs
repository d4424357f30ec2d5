//! Configuration loading and validation

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use netbox_sd_core::{ConfigError, Group, GroupConfig, parse_interval, validate_groups};

/// Top-level configuration for the netbox-sd daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// NetBox base URL, must use https
    #[serde(default)]
    pub base_url: String,
    /// NetBox API token
    #[serde(default)]
    pub api_token: String,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub allow_insecure: bool,
    /// Default scan interval of all groups, e.g. `5m`
    #[serde(default)]
    pub scan_interval: String,
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Target groups
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port of the metrics endpoint
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "[::]:9099".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadingFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    /// Returns error if the content is not a valid configuration document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParsingFile(e.to_string()))
    }

    /// Load from an explicit path or the first default path that exists
    ///
    /// # Errors
    /// Returns `MissingFile` if no path was given and none of the defaults exist
    pub fn load_default(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        if let Some(path) = path {
            return Ok((Self::load(path)?, path.to_path_buf()));
        }

        // Check environment variable
        if let Ok(path) = std::env::var("NETBOX_SD_CONFIG") {
            let path = PathBuf::from(path);
            return Ok((Self::load(&path)?, path));
        }

        // Try common paths
        let paths = [
            Some(PathBuf::from("netbox-sd.toml")),
            Some(PathBuf::from("/etc/netbox-sd/netbox-sd.toml")),
            dirs::config_dir().map(|p| p.join("netbox-sd/netbox-sd.toml")),
        ];

        for path in paths.into_iter().flatten() {
            if path.exists() {
                return Ok((Self::load(&path)?, path));
            }
        }

        Err(ConfigError::MissingFile)
    }

    /// Check the global settings and validate every group
    ///
    /// # Errors
    /// Returns the first problem found
    pub fn validate(&self) -> Result<Vec<Group>, ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingRequired("base_url"));
        }
        if !self.base_url.starts_with("https") {
            return Err(ConfigError::BaseUrlMissingTls);
        }
        if self.api_token.is_empty() {
            return Err(ConfigError::MissingRequired("api_token"));
        }
        if self.scan_interval.is_empty() {
            return Err(ConfigError::MissingRequired("scan_interval"));
        }

        let interval = self.default_interval()?;
        validate_groups(&self.groups, interval)
    }

    fn default_interval(&self) -> Result<Duration, ConfigError> {
        parse_interval(&self.scan_interval, "global")
    }
}
