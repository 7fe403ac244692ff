//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Keep count for an explicit prune that does not name one.
pub const DEFAULT_KEEP_COUNT: u64 = 10;

/// Tunables for a [`Vfs`](crate::Vfs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VfsConfig {
    /// Versions to retain per file when writes prune automatically.
    ///
    /// `None` keeps every version; history is then only trimmed by an
    /// explicit [`Project::prune_versions`](crate::Project::prune_versions).
    #[serde(default)]
    pub keep_versions: Option<u64>,
}

impl VfsConfig {
    /// Prune each file down to `keep` versions after every write.
    pub fn keeping(keep: u64) -> Self {
        Self {
            keep_versions: Some(keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keeps_everything() {
        assert_eq!(VfsConfig::default().keep_versions, None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: VfsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VfsConfig::default());
        let config: VfsConfig = serde_json::from_str(r#"{"keep_versions": 4}"#).unwrap();
        assert_eq!(config, VfsConfig::keeping(4));
    }
}
