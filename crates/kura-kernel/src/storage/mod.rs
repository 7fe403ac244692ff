//! Key/value persistence backends.
//!
//! The engine only needs four capabilities from storage: get, save, delete,
//! and bulk delete by parent id. Records live in named tables and carry an
//! opaque blob plus a little metadata:
//!
//! ```text
//! vfs_trees       vfs_tree_{projectId}   → tree document
//! vfs_files       {fileId}               → VfsFile      (parentId = projectId)
//! vfs_versions    {fileId}_v{version}    → VfsVersion   (parentId = fileId)
//! vfs_quarantine  vfs_tree_{projectId}_{ms} → unreadable tree blobs
//! ```
//!
//! - **MemoryStorage**: in-memory, for tests and ephemeral projects
//! - **LocalStorage**: one JSON envelope per record under a root directory

mod local;
mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kura_types::{Timestamp, VfsError};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<StorageError> for VfsError {
    fn from(err: StorageError) -> Self {
        VfsError::storage(err.to_string())
    }
}

/// Metadata stored beside each blob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Owner used for bulk deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl RecordMeta {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: Some(timestamp),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// A blob as it sits in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub blob: Vec<u8>,
    pub meta: RecordMeta,
}

/// Abstract key/value store.
///
/// Implementations must be safe to share between tasks. They make no
/// ordering promises of their own; the engine serializes tree mutations
/// per project before it calls in.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch a record, or `None` if it does not exist.
    async fn get(&self, table: &str, id: &str) -> StorageResult<Option<StoredRecord>>;

    /// Insert or replace a record.
    async fn save(&self, table: &str, id: &str, blob: Vec<u8>, meta: RecordMeta)
        -> StorageResult<()>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete(&self, table: &str, id: &str) -> StorageResult<()>;

    /// Delete every record in `table` whose `parent_id` matches.
    ///
    /// Returns the number of records removed.
    async fn delete_many(&self, table: &str, parent_id: &str) -> StorageResult<usize>;
}
