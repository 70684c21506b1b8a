//! Drive configuration.
//!
//! Deserializable from TOML (the CLI loads a config file) or built directly
//! by an embedding host. Only transport-level knobs live here; the drive
//! itself carries no tunable behavior.

use serde::Deserialize;

use crate::error::{DriveError, DriveResult};

/// Configuration for a [`crate::Drive`].
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Base URL of the backend REST service, e.g. `https://host/bucket/api`.
    pub base_url: String,
    /// Fixed public-access prefix for download links. Concatenated with the
    /// logical path; no query parameters, no expiry.
    pub download_url_prefix: String,
    /// Identifier the host uses to register the drive.
    #[serde(default = "default_drive_name")]
    pub name: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_drive_name() -> String {
    "bucket".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl DriveConfig {
    /// Build a config with default name and timeout.
    pub fn new(base_url: impl Into<String>, download_url_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            download_url_prefix: download_url_prefix.into(),
            name: default_drive_name(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> DriveResult<Self> {
        toml::from_str(text)
            .map_err(|e| DriveError::Malformed(format!("bad drive config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = DriveConfig::from_toml(
            r#"
            base_url = "https://host/api/storage"
            download_url_prefix = "https://storage.example.com/"
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "bucket");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        assert!(DriveConfig::from_toml("download_url_prefix = \"x\"").is_err());
    }
}
