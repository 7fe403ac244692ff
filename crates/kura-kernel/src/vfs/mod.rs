//! The VFS engine: filesystem operations over a project's tree.
//!
//! Every operation follows the same cycle under the project's lock:
//!
//! ```text
//! lock(project) → load tree → navigate / mutate → save files, versions
//!               → save tree → unlock
//! ```
//!
//! Node lifecycle:
//!
//! ```text
//! nonexistent ──create──▶ active ──delete──▶ soft-deleted ──purge──▶ gone
//!                            ▲                    │
//!                            └──────restore───────┘
//! ```
//!
//! Paths supplied by callers are resolved through the project handle's
//! namespace (see [`crate::paths`]) before they reach the tree.

mod dirs;
mod files;
mod history;
mod moves;

pub use dirs::DIRECTORY_MIME;

use std::future::Future;
use std::sync::Arc;

use kura_types::{OrphanEntry, Timestamp, VfsError, VfsFile, VfsResult, VfsVersion};

use crate::codec::{BlobCodec, PlainCodec};
use crate::config::VfsConfig;
use crate::content::FileContent;
use crate::lock::TreeLocks;
use crate::paths::{is_mount_root, is_namespaced_readonly, is_root_path, resolve_namespaced_path};
use crate::storage::{MemoryStorage, Storage};
use crate::store::Store;
use crate::tree::{FileNode, NodeId, VfsTree};

/// A versioned virtual filesystem over key/value storage.
///
/// One `Vfs` serves any number of projects; each project has its own tree
/// and its own lock.
#[derive(Debug)]
pub struct Vfs {
    store: Store,
    locks: TreeLocks,
    config: VfsConfig,
}

impl Vfs {
    /// Create an engine over the given storage and codec.
    pub fn new(storage: Arc<dyn Storage>, codec: Arc<dyn BlobCodec>) -> Self {
        Self {
            store: Store::new(storage, codec),
            locks: TreeLocks::new(),
            config: VfsConfig::default(),
        }
    }

    /// An engine over fresh in-memory storage with the plaintext codec.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(PlainCodec))
    }

    pub fn with_config(mut self, config: VfsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn locks(&self) -> &TreeLocks {
        &self.locks
    }

    /// A handle for operating on one project.
    pub fn project(&self, project_id: impl Into<String>) -> Project<'_> {
        Project {
            vfs: self,
            id: project_id.into(),
            namespace: None,
        }
    }
}

/// Operations on a single project, optionally confined to a namespace.
#[derive(Debug, Clone)]
pub struct Project<'a> {
    vfs: &'a Vfs,
    id: String,
    namespace: Option<String>,
}

impl Project<'_> {
    /// Confine every path to `namespace`, except the shared mounts.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    // ================================================================
    // Guards
    // ================================================================

    pub(crate) fn resolve(&self, path: &str) -> String {
        resolve_namespaced_path(path, self.namespace())
    }

    /// Fail with `READONLY` if the caller's path is read-only for this
    /// namespace. Checked before namespace resolution.
    pub(crate) fn check_writable(&self, caller_path: &str) -> VfsResult<()> {
        if is_namespaced_readonly(caller_path, self.namespace()) {
            return Err(VfsError::readonly(caller_path));
        }
        Ok(())
    }

    /// Fail with `INVALID_PATH` if a resolved path is the root or a mount
    /// root.
    pub(crate) fn check_removable(resolved: &str) -> VfsResult<()> {
        if is_root_path(resolved) {
            return Err(VfsError::invalid_path("cannot remove or move the root directory"));
        }
        if is_mount_root(resolved) {
            return Err(VfsError::invalid_path(format!(
                "cannot remove or move mount root: {resolved}"
            )));
        }
        Ok(())
    }

    pub(crate) async fn locked<F: Future>(&self, fut: F) -> F::Output {
        self.vfs.locks.with_tree_lock(&self.id, fut).await
    }

    // ================================================================
    // Shared steps
    // ================================================================

    pub(crate) fn store(&self) -> &Store {
        &self.vfs.store
    }

    pub(crate) async fn load_tree(&self) -> VfsResult<VfsTree> {
        self.store().load_tree(&self.id).await
    }

    pub(crate) async fn save_tree(&self, tree: &VfsTree) -> VfsResult<()> {
        self.store().save_tree(&self.id, tree).await
    }

    /// Live record of a file that the tree says exists.
    pub(crate) async fn load_live(&self, file_id: &str, path: &str) -> VfsResult<VfsFile> {
        self.store().load_file(file_id).await?.ok_or_else(|| {
            VfsError::storage(format!("content record {file_id} missing for {path}"))
        })
    }

    /// Start a new content lineage at version 1.
    pub(crate) async fn create_lineage(&self, content: &FileContent, now: Timestamp) -> VfsResult<FileNode> {
        let file_id = uuid::Uuid::new_v4().to_string();
        let file = VfsFile {
            content: content.encode(),
            version: 1,
            created_at: now,
            updated_at: now,
            min_stored_version: None,
        };
        self.store().save_file(&self.id, &file_id, &file).await?;
        Ok(FileNode {
            file_id,
            is_binary: content.is_binary(),
            mime: content.mime().to_string(),
        })
    }

    /// Snapshot the live content, then make `content` the next version.
    ///
    /// History is trimmed here only when `keep_versions` is configured.
    pub(crate) async fn commit_version(
        &self,
        file_id: &str,
        mut file: VfsFile,
        content: String,
        now: Timestamp,
    ) -> VfsResult<VfsFile> {
        let previous = std::mem::replace(&mut file.content, content);
        self.store()
            .save_version(
                file_id,
                &VfsVersion {
                    content: previous,
                    version: file.version,
                    created_at: file.updated_at,
                },
            )
            .await?;

        file.version += 1;
        file.updated_at = now;
        if let Some(keep) = self.vfs.config.keep_versions {
            self.store().prune_versions(file_id, &mut file, keep).await?;
        }
        self.store().save_file(&self.id, file_id, &file).await?;
        Ok(file)
    }

    /// Permanently delete content lineages (live record and history).
    pub(crate) async fn purge_content(&self, file_ids: &[String]) -> VfsResult<()> {
        for file_id in file_ids {
            self.store().delete_file_content(file_id).await?;
        }
        if !file_ids.is_empty() {
            tracing::info!(project = %self.id, count = file_ids.len(), "purged file content");
        }
        Ok(())
    }
}

/// Node at a path, whatever its state.
pub(crate) fn find(tree: &VfsTree, path: &str) -> VfsResult<NodeId> {
    tree.lookup(path).ok_or_else(|| VfsError::not_found(path))
}

/// A non-deleted file node at a path.
pub(crate) fn active_file(tree: &VfsTree, path: &str) -> VfsResult<(NodeId, FileNode)> {
    let id = find(tree, path)?;
    let node = tree.node(id);
    let file = node.file().ok_or_else(|| VfsError::not_a_file(path))?;
    if node.deleted {
        return Err(VfsError::is_deleted(path));
    }
    Ok((id, file.clone()))
}

/// Move every file lineage in a subtree to the orphan list.
///
/// Each entry records the path the file lived at. The caller detaches the
/// subtree afterwards.
pub(crate) fn orphan_subtree(tree: &mut VfsTree, id: NodeId, now: Timestamp) -> usize {
    let entries: Vec<OrphanEntry> = tree
        .subtree(id)
        .into_iter()
        .filter_map(|n| {
            tree.node(n).file().map(|file| OrphanEntry {
                file_id: file.file_id.clone(),
                original_path: tree.path_of(n),
                orphaned_at: now,
                is_binary: file.is_binary,
                mime: file.mime.clone(),
            })
        })
        .collect();

    let count = entries.len();
    for entry in entries {
        tracing::info!(file_id = %entry.file_id, path = %entry.original_path, "orphaned file");
        tree.push_orphan(entry);
    }
    count
}

/// Detach a soft-deleted node that a new node is about to replace.
///
/// Returns the file ids whose content must be purged once the tree is saved.
pub(crate) fn displace(tree: &mut VfsTree, id: NodeId) -> Vec<String> {
    let file_ids = tree.file_ids_in(id);
    tree.detach(id);
    file_ids
}
