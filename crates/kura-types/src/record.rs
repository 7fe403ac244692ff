//! Persisted record shapes.
//!
//! These are the JSON payloads that pass through the blob codec into storage.
//! Keys are camelCase so documents written by other kura clients stay
//! readable.
//!
//! ```text
//! TreeDocument
//! ├── children: { name → NodeRecord }
//! │   ├── { type: "dir",  deleted, createdAt, updatedAt, children: {...} }
//! │   └── { type: "file", deleted, createdAt, updatedAt, fileId, isBinary, mime }
//! └── orphans: [ OrphanEntry ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_MIME, Timestamp};

fn default_mime() -> String {
    DEFAULT_MIME.to_string()
}

/// The per-project tree document, exactly as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    pub children: BTreeMap<String, NodeRecord>,
    #[serde(default)]
    pub orphans: Vec<OrphanEntry>,
}

/// One named entry of a persisted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum NodeRecord {
    File {
        #[serde(default)]
        deleted: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
        file_id: String,
        #[serde(default)]
        is_binary: bool,
        #[serde(default = "default_mime")]
        mime: String,
    },
    Dir {
        #[serde(default)]
        deleted: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
        #[serde(default)]
        children: BTreeMap<String, NodeRecord>,
    },
}

/// Current content of a file lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VfsFile {
    /// Text, or standard base64 for binary files.
    pub content: String,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Lowest version whose snapshot survived pruning. `None` means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stored_version: Option<u64>,
}

impl VfsFile {
    /// Lowest version number with a stored snapshot (or the live version).
    pub fn min_version(&self) -> u64 {
        self.min_stored_version.unwrap_or(1)
    }
}

/// Immutable snapshot of the content a version held before it was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VfsVersion {
    pub content: String,
    pub version: u64,
    pub created_at: Timestamp,
}

/// A file lineage that no tree path reaches anymore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanEntry {
    pub file_id: String,
    /// Last tree path the lineage lived at.
    pub original_path: String,
    pub orphaned_at: Timestamp,
    #[serde(default)]
    pub is_binary: bool,
    #[serde(default = "default_mime")]
    pub mime: String,
}
