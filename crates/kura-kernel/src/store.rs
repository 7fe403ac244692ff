//! Tree, file, and version persistence.
//!
//! Every payload is JSON, run through the [`BlobCodec`] before it reaches
//! [`Storage`]. The store knows table names and key formats; it knows
//! nothing about locking or path semantics.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use kura_types::{Timestamp, TreeDocument, VfsError, VfsFile, VfsResult, VfsVersion};

use crate::codec::BlobCodec;
use crate::storage::{RecordMeta, Storage};
use crate::tree::VfsTree;

pub const TREES_TABLE: &str = "vfs_trees";
pub const FILES_TABLE: &str = "vfs_files";
pub const VERSIONS_TABLE: &str = "vfs_versions";
pub const QUARANTINE_TABLE: &str = "vfs_quarantine";

/// Storage key of a project's tree document.
pub fn tree_key(project_id: &str) -> String {
    format!("vfs_tree_{project_id}")
}

/// Storage key of one version snapshot.
pub fn version_key(file_id: &str, version: u64) -> String {
    format!("{file_id}_v{version}")
}

pub(crate) fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Codec-wrapped access to the three VFS tables.
#[derive(Clone)]
pub struct Store {
    storage: Arc<dyn Storage>,
    codec: Arc<dyn BlobCodec>,
}

impl Store {
    pub fn new(storage: Arc<dyn Storage>, codec: Arc<dyn BlobCodec>) -> Self {
        Self { storage, codec }
    }

    async fn put<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        value: &T,
        meta: RecordMeta,
    ) -> VfsResult<()> {
        let json = serde_json::to_string(value)?;
        let blob = self.codec.encrypt_and_compress(&json).await?;
        self.storage.save(table, id, blob, meta).await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, table: &str, id: &str) -> VfsResult<Option<T>> {
        let Some(record) = self.storage.get(table, id).await? else {
            return Ok(None);
        };
        let json = self.codec.decrypt_and_decompress(&record.blob).await?;
        let value = serde_json::from_str(&json).map_err(|e| {
            VfsError::storage(format!("corrupt record {table}/{id}: {e}"))
        })?;
        Ok(Some(value))
    }

    // ================================================================
    // Trees
    // ================================================================

    /// Load a project's tree.
    ///
    /// A missing document is an empty tree. So is one that cannot be
    /// decoded or lacks `children`: availability wins over strictness, and
    /// the unreadable blob is copied to quarantine before anything can
    /// overwrite it.
    pub async fn load_tree(&self, project_id: &str) -> VfsResult<VfsTree> {
        let key = tree_key(project_id);
        let Some(record) = self.storage.get(TREES_TABLE, &key).await? else {
            return Ok(VfsTree::new());
        };

        match self.decode_tree(&record.blob).await {
            Ok(doc) => Ok(VfsTree::from_document(doc)),
            Err(reason) => {
                let quarantine_id = format!("{key}_{}", now_ms());
                tracing::warn!(
                    project = %project_id,
                    quarantine = %quarantine_id,
                    %reason,
                    "tree document unreadable, starting from an empty tree"
                );
                self.storage
                    .save(
                        QUARANTINE_TABLE,
                        &quarantine_id,
                        record.blob,
                        RecordMeta::new(now_ms()).with_parent(project_id),
                    )
                    .await?;
                Ok(VfsTree::new())
            }
        }
    }

    async fn decode_tree(&self, blob: &[u8]) -> Result<TreeDocument, String> {
        let json = self
            .codec
            .decrypt_and_decompress(blob)
            .await
            .map_err(|e| e.to_string())?;
        let value: serde_json::Value = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        if !value.get("children").is_some_and(serde_json::Value::is_object) {
            return Err("missing children".to_string());
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    pub async fn save_tree(&self, project_id: &str, tree: &VfsTree) -> VfsResult<()> {
        self.put(
            TREES_TABLE,
            &tree_key(project_id),
            &tree.to_document(),
            RecordMeta::new(now_ms()),
        )
        .await
    }

    pub async fn delete_tree(&self, project_id: &str) -> VfsResult<()> {
        self.storage.delete(TREES_TABLE, &tree_key(project_id)).await?;
        Ok(())
    }

    // ================================================================
    // Files
    // ================================================================

    /// Persist the live record of a file, tagged with its project.
    pub async fn save_file(&self, project_id: &str, file_id: &str, file: &VfsFile) -> VfsResult<()> {
        self.put(
            FILES_TABLE,
            file_id,
            file,
            RecordMeta::new(file.updated_at).with_parent(project_id),
        )
        .await
    }

    pub async fn load_file(&self, file_id: &str) -> VfsResult<Option<VfsFile>> {
        self.fetch(FILES_TABLE, file_id).await
    }

    /// Delete a file's live record and every snapshot.
    pub async fn delete_file_content(&self, file_id: &str) -> VfsResult<()> {
        self.storage.delete(FILES_TABLE, file_id).await?;
        self.storage.delete_many(VERSIONS_TABLE, file_id).await?;
        Ok(())
    }

    /// Delete every live file record tagged with a project.
    pub async fn delete_project_files(&self, project_id: &str) -> VfsResult<usize> {
        Ok(self.storage.delete_many(FILES_TABLE, project_id).await?)
    }

    // ================================================================
    // Versions
    // ================================================================

    pub async fn save_version(&self, file_id: &str, version: &VfsVersion) -> VfsResult<()> {
        self.put(
            VERSIONS_TABLE,
            &version_key(file_id, version.version),
            version,
            RecordMeta::new(version.created_at).with_parent(file_id),
        )
        .await
    }

    pub async fn load_version(&self, file_id: &str, version: u64) -> VfsResult<Option<VfsVersion>> {
        self.fetch(VERSIONS_TABLE, &version_key(file_id, version)).await
    }

    /// Delete snapshots older than `version - keep` and raise
    /// `min_stored_version` to match. Mutates `file` but does not save it.
    ///
    /// Returns true if anything was pruned.
    pub async fn prune_versions(&self, file_id: &str, file: &mut VfsFile, keep: u64) -> VfsResult<bool> {
        if file.version <= keep {
            return Ok(false);
        }
        let cutoff = file.version - keep;
        let first = file.min_version();
        if first >= cutoff {
            return Ok(false);
        }
        for version in first..cutoff {
            self.storage
                .delete(VERSIONS_TABLE, &version_key(file_id, version))
                .await?;
        }
        tracing::debug!(file_id, first, cutoff, "pruned old versions");
        file.min_stored_version = Some(cutoff);
        Ok(true)
    }

    /// Load a file, prune its history to `keep` versions, save it back.
    pub async fn drop_old_versions(&self, project_id: &str, file_id: &str, keep: u64) -> VfsResult<()> {
        let Some(mut file) = self.load_file(file_id).await? else {
            return Ok(());
        };
        if self.prune_versions(file_id, &mut file, keep).await? {
            self.save_file(project_id, file_id, &file).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PlainCodec;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, Store) {
        let mem = Arc::new(MemoryStorage::new());
        let store = Store::new(mem.clone(), Arc::new(PlainCodec));
        (mem, store)
    }

    fn live(version: u64) -> VfsFile {
        VfsFile {
            content: format!("v{version}"),
            version,
            created_at: 1,
            updated_at: 1,
            min_stored_version: None,
        }
    }

    #[tokio::test]
    async fn missing_tree_is_empty() {
        let (_, store) = store();
        let tree = store.load_tree("p").await.unwrap();
        assert!(tree.children(tree.root()).is_empty());
        assert!(tree.orphans().is_empty());
    }

    #[tokio::test]
    async fn corrupt_tree_is_quarantined() {
        let (mem, store) = store();
        mem.save(TREES_TABLE, &tree_key("p"), b"{\"orphans\":[]}".to_vec(), RecordMeta::default())
            .await
            .unwrap();

        let tree = store.load_tree("p").await.unwrap();
        assert!(tree.children(tree.root()).is_empty());

        let quarantined = mem.ids(QUARANTINE_TABLE).await;
        assert_eq!(quarantined.len(), 1);
        assert!(quarantined[0].starts_with("vfs_tree_p_"));
        let blob = mem.get(QUARANTINE_TABLE, &quarantined[0]).await.unwrap().unwrap().blob;
        assert_eq!(blob, b"{\"orphans\":[]}");
    }

    #[tokio::test]
    async fn unparseable_tree_is_empty() {
        let (mem, store) = store();
        mem.save(TREES_TABLE, &tree_key("p"), b"not json".to_vec(), RecordMeta::default())
            .await
            .unwrap();
        let tree = store.load_tree("p").await.unwrap();
        assert!(tree.children(tree.root()).is_empty());
    }

    #[tokio::test]
    async fn files_are_tagged_with_project() {
        let (mem, store) = store();
        store.save_file("proj", "f1", &live(1)).await.unwrap();
        let record = mem.get(FILES_TABLE, "f1").await.unwrap().unwrap();
        assert_eq!(record.meta.parent_id.as_deref(), Some("proj"));
        assert_eq!(store.load_file("f1").await.unwrap().unwrap(), live(1));
    }

    #[tokio::test]
    async fn prune_is_noop_within_keep() {
        let (_, store) = store();
        let mut file = live(10);
        assert!(!store.prune_versions("f", &mut file, 10).await.unwrap());
        assert_eq!(file.min_stored_version, None);
    }

    #[tokio::test]
    async fn drop_old_versions_deletes_below_cutoff() {
        let (mem, store) = store();
        for v in 1..12 {
            store
                .save_version("f", &VfsVersion { content: format!("v{v}"), version: v, created_at: v as i64 })
                .await
                .unwrap();
        }
        store.save_file("p", "f", &live(12)).await.unwrap();

        store.drop_old_versions("p", "f", 10).await.unwrap();
        let file = store.load_file("f").await.unwrap().unwrap();
        assert_eq!(file.min_stored_version, Some(2));
        assert!(store.load_version("f", 1).await.unwrap().is_none());
        assert!(store.load_version("f", 2).await.unwrap().is_some());
        assert_eq!(mem.len(VERSIONS_TABLE).await, 10);

        // Idempotent.
        store.drop_old_versions("p", "f", 10).await.unwrap();
        assert_eq!(mem.len(VERSIONS_TABLE).await, 10);
    }
}
