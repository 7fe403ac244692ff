//! Configuration for the kura shell.
//!
//! Loaded from `$XDG_CONFIG_HOME/kura/config.toml`; every field is optional
//! and command-line flags win over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kura_kernel::VfsConfig;

use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KuraConfig {
    /// Root of the directory-backed store. Defaults to the XDG data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Project opened at startup.
    #[serde(default = "default_project")]
    pub project: String,

    /// Namespace applied to every path, if any.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Versions retained per file when writes prune automatically.
    /// Unset keeps every version.
    #[serde(default)]
    pub keep_versions: Option<u64>,
}

fn default_project() -> String {
    "default".to_string()
}

impl Default for KuraConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            project: default_project(),
            namespace: None,
            keep_versions: None,
        }
    }
}

impl KuraConfig {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = paths::config_path();
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Where the store lives.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(paths::store_dir)
    }

    /// Engine settings derived from this configuration.
    pub fn vfs_config(&self) -> VfsConfig {
        VfsConfig {
            keep_versions: self.keep_versions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KuraConfig::default();
        assert_eq!(config.project, "default");
        assert_eq!(config.keep_versions, None);
        assert!(config.namespace.is_none());
        assert!(config.store_dir().ends_with("store"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
data_dir = "/srv/kura"
project = "notes"
namespace = "/team"
keep_versions = 25
"#;
        let config: KuraConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store_dir(), PathBuf::from("/srv/kura"));
        assert_eq!(config.project, "notes");
        assert_eq!(config.namespace.as_deref(), Some("/team"));
        assert_eq!(config.vfs_config(), VfsConfig::keeping(25));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: KuraConfig = toml::from_str("project = \"scratch\"").unwrap();
        assert_eq!(config.project, "scratch");
        assert_eq!(config.vfs_config(), VfsConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "keep_versions = 3\n").unwrap();
        let config = KuraConfig::load_from(&path).unwrap();
        assert_eq!(config.keep_versions, Some(3));

        std::fs::write(&path, "keep_versions = \"many\"\n").unwrap();
        assert!(KuraConfig::load_from(&path).is_err());
    }
}
