//! Shapes returned by VFS operations.

use serde::{Deserialize, Serialize};

use crate::{OrphanEntry, Timestamp};

/// Kind of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Dir,
}

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Content size in bytes. `None` for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DirEntry {
    /// Returns true if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == NodeType::Dir
    }

    /// Returns true if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeType::File
    }
}

/// Metadata for a single active node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VfsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub size: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub is_binary: bool,
    pub mime: String,
}

/// Content of a file, as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileResult {
    /// Text, or base64 for binary files.
    pub content: String,
    pub is_binary: bool,
    pub mime: String,
    /// Decoded bytes, present only for binary files.
    #[serde(skip)]
    pub buffer: Option<Vec<u8>>,
}

/// One entry of a file's version history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version: u64,
    pub created_at: Timestamp,
}

/// Orphans are reported exactly as they are recorded in the tree.
pub type OrphanInfo = OrphanEntry;

/// Outcome of a successful `str_replace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrReplaceResult {
    /// Version the file holds after the edit.
    pub version: u64,
    /// 1-indexed line where the replaced text started.
    pub line: usize,
    /// Numbered lines surrounding the edit.
    pub snippet: String,
}

/// Outcome of a successful `insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub version: u64,
    pub snippet: String,
}
