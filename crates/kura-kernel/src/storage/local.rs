//! Local directory storage backend.
//!
//! Each record is a small JSON envelope on disk:
//!
//! ```text
//! {root}/{table}/{base64url(id)}.json
//!   { "blob": "<base64>", "timestamp": 1700000000000, "parentId": "..." }
//! ```
//!
//! Ids are base64url-encoded into file names, so no id can name a path
//! outside its table directory. An id whose encoded name (plus the
//! temporary-file suffix) would pass the usual 255-byte file name limit is
//! refused as an invalid key.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{RecordMeta, Storage, StorageError, StorageResult, StoredRecord};

/// Longest file name most filesystems accept.
const MAX_FILE_NAME: usize = 255;

/// Suffix of the file a record is written to before it is renamed.
const TMP_SUFFIX: &str = ".json.tmp";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    blob: String,
    #[serde(flatten)]
    meta: RecordMeta,
}

/// Directory-backed key/value store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_dir(&self, table: &str) -> StorageResult<PathBuf> {
        let valid = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(format!("table name: {table:?}")));
        }
        Ok(self.root.join(table))
    }

    fn record_path(&self, table: &str, id: &str) -> StorageResult<PathBuf> {
        if id.is_empty() {
            return Err(StorageError::InvalidKey("empty record id".to_string()));
        }
        let encoded = URL_SAFE_NO_PAD.encode(id);
        if encoded.len() + TMP_SUFFIX.len() > MAX_FILE_NAME {
            return Err(StorageError::InvalidKey(format!(
                "record id is {} bytes, too long for a file name",
                id.len()
            )));
        }
        Ok(self.table_dir(table)?.join(format!("{encoded}.json")))
    }

    async fn read_envelope(path: &Path) -> StorageResult<Option<Envelope>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope = serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))?;
        Ok(Some(envelope))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn get(&self, table: &str, id: &str) -> StorageResult<Option<StoredRecord>> {
        let path = self.record_path(table, id)?;
        let Some(envelope) = Self::read_envelope(&path).await? else {
            return Ok(None);
        };
        let blob = STANDARD
            .decode(envelope.blob.as_bytes())
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", path.display(), e)))?;
        Ok(Some(StoredRecord {
            blob,
            meta: envelope.meta,
        }))
    }

    async fn save(
        &self,
        table: &str,
        id: &str,
        blob: Vec<u8>,
        meta: RecordMeta,
    ) -> StorageResult<()> {
        let path = self.record_path(table, id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let envelope = Envelope {
            blob: STANDARD.encode(&blob),
            meta,
        };
        let json = serde_json::to_vec(&envelope)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        // Write-then-rename so readers never see a torn record.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> StorageResult<()> {
        let path = self.record_path(table, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_many(&self, table: &str, parent_id: &str) -> StorageResult<usize> {
        let dir = self.table_dir(table)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(envelope) = Self::read_envelope(&path).await? else {
                continue;
            };
            if envelope.meta.parent_id.as_deref() == Some(parent_id) {
                match fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_get() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path());

        store
            .save("vfs_files", "abc", vec![0, 159, 146, 150], RecordMeta::new(7).with_parent("p"))
            .await
            .unwrap();

        let record = store.get("vfs_files", "abc").await.unwrap().unwrap();
        assert_eq!(record.blob, vec![0, 159, 146, 150]);
        assert_eq!(record.meta.timestamp, Some(7));
        assert_eq!(record.meta.parent_id.as_deref(), Some("p"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path());
        assert!(store.get("t", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_root() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path().join("store"));

        store
            .save("t", "../../escape", b"x".to_vec(), RecordMeta::default())
            .await
            .unwrap();

        assert!(!dir.path().join("escape").exists());
        let record = store.get("t", "../../escape").await.unwrap().unwrap();
        assert_eq!(record.blob, b"x");
    }

    #[tokio::test]
    async fn test_long_ids_rejected_before_io() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path());

        // 184 bytes encode to 246 characters, 255 with the temp suffix.
        let longest = "p".repeat(184);
        store.save("t", &longest, b"x".to_vec(), RecordMeta::default()).await.unwrap();
        assert_eq!(store.get("t", &longest).await.unwrap().unwrap().blob, b"x");

        let too_long = "p".repeat(185);
        let result = store.save("t", &too_long, b"x".to_vec(), RecordMeta::default()).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(matches!(store.get("t", &too_long).await, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_bad_table_name_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path());
        let result = store.get("../t", "a").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_and_delete_many() {
        let dir = tempdir().unwrap();
        let store = LocalStorage::new(dir.path());
        for (id, parent) in [("f1_v1", "f1"), ("f1_v2", "f1"), ("f2_v1", "f2")] {
            store
                .save("vfs_versions", id, Vec::new(), RecordMeta::new(0).with_parent(parent))
                .await
                .unwrap();
        }

        assert_eq!(store.delete_many("vfs_versions", "f1").await.unwrap(), 2);
        assert!(store.get("vfs_versions", "f1_v1").await.unwrap().is_none());
        assert!(store.get("vfs_versions", "f2_v1").await.unwrap().is_some());

        store.delete("vfs_versions", "f2_v1").await.unwrap();
        store.delete("vfs_versions", "f2_v1").await.unwrap();
        assert!(store.get("vfs_versions", "f2_v1").await.unwrap().is_none());
        assert_eq!(store.delete_many("never_written", "x").await.unwrap(), 0);
    }
}
