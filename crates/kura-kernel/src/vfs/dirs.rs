//! Directory operations and metadata queries.

use kura_types::{DirEntry, ErrorCode, NodeType, VfsError, VfsResult, VfsStat};

use super::{Project, displace, find};
use crate::content::stored_size;
use crate::paths::{basename, join_path, parent_dir};
use crate::store::now_ms;
use crate::tree::{NodeId, VfsTree};

/// MIME reported by `stat` for directories.
pub const DIRECTORY_MIME: &str = "inode/directory";

impl Project<'_> {
    /// Create a directory, creating missing parents.
    ///
    /// A soft-deleted directory at the path comes back in place; its
    /// children keep their own state.
    pub async fn mkdir(&self, path: &str) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "mkdir");
        if basename(&resolved).is_empty() {
            return Err(VfsError::invalid_path("cannot create the root directory"));
        }
        self.check_writable(path)?;
        self.locked(self.mkdir_locked(&resolved)).await
    }

    async fn mkdir_locked(&self, path: &str) -> VfsResult<()> {
        let now = now_ms();
        let mut tree = self.load_tree().await?;
        let mut displaced = Vec::new();

        if let Some(id) = tree.lookup(path) {
            let node = tree.node(id);
            match (node.is_dir(), node.deleted) {
                (true, false) => return Err(VfsError::dir_exists(path)),
                (false, false) => return Err(VfsError::file_exists(path)),
                (true, true) => {
                    let node = tree.node_mut(id);
                    node.deleted = false;
                    node.updated_at = now;
                    tree.resurrect_ancestors(id, now);
                    return self.save_tree(&tree).await;
                }
                (false, true) => displaced = displace(&mut tree, id),
            }
        }

        let parent = tree
            .ensure_parent_exists(path, now)
            .ok_or_else(|| VfsError::not_a_directory(&parent_dir(path)))?;
        tree.insert_dir(parent, &basename(path), now);
        self.save_tree(&tree).await?;
        self.purge_content(&displaced).await
    }

    /// Soft-delete a directory and everything beneath it.
    ///
    /// Without `recursive`, a directory with any active child is refused.
    pub async fn rmdir(&self, path: &str, recursive: bool) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, recursive, "rmdir");
        Self::check_removable(&resolved)?;
        self.check_writable(path)?;
        self.locked(self.rmdir_locked(&resolved, recursive)).await
    }

    async fn rmdir_locked(&self, path: &str, recursive: bool) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let id = find(&tree, path)?;
        if !tree.node(id).is_dir() {
            return Err(VfsError::not_a_directory(path));
        }
        if tree.node(id).deleted {
            return Ok(());
        }
        if !recursive && tree.has_active_children(id) {
            return Err(VfsError::new(
                ErrorCode::DirNotEmpty,
                format!("directory not empty: {path}"),
            ));
        }
        let marked = tree.mark_subtree(id, true, now_ms());
        tracing::debug!(path, marked, "soft-deleted directory");
        self.save_tree(&tree).await
    }

    /// List a directory's children: directories first, then by name.
    pub async fn read_dir(&self, path: &str, include_deleted: bool) -> VfsResult<Vec<DirEntry>> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, include_deleted, "read_dir");
        self.locked(self.read_dir_locked(&resolved, include_deleted)).await
    }

    async fn read_dir_locked(&self, path: &str, include_deleted: bool) -> VfsResult<Vec<DirEntry>> {
        let tree = self.load_tree().await?;
        let dir = active_dir(&tree, path)?;

        let mut entries = Vec::new();
        for (name, id) in tree.children(dir) {
            let node = tree.node(id);
            if node.deleted && !include_deleted {
                continue;
            }
            let (kind, size) = match node.file() {
                None => (NodeType::Dir, None),
                Some(file) => {
                    let size = match self.store().load_file(&file.file_id).await? {
                        Some(live) => Some(stored_size(&live.content, file.is_binary)),
                        None => {
                            tracing::warn!(
                                file_id = %file.file_id,
                                path = %join_path(path, &name),
                                "content record missing"
                            );
                            None
                        }
                    };
                    (NodeType::File, size)
                }
            };
            entries.push(DirEntry {
                name,
                kind,
                deleted: node.deleted,
                created_at: node.created_at,
                updated_at: node.updated_at,
                size,
            });
        }

        // Children come out of the tree in name order; the sort is stable.
        entries.sort_by_key(|e| !e.is_dir());
        Ok(entries)
    }

    /// Metadata for an active file or directory.
    pub async fn stat(&self, path: &str) -> VfsResult<VfsStat> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "stat");
        self.locked(self.stat_locked(&resolved)).await
    }

    async fn stat_locked(&self, path: &str) -> VfsResult<VfsStat> {
        let tree = self.load_tree().await?;
        let id = find(&tree, path)?;
        let node = tree.node(id);
        if node.deleted {
            return Err(VfsError::is_deleted(path));
        }

        match node.file() {
            None => Ok(VfsStat {
                is_file: false,
                is_directory: true,
                size: 0,
                created_at: node.created_at,
                updated_at: node.updated_at,
                is_binary: false,
                mime: DIRECTORY_MIME.to_string(),
            }),
            Some(file) => {
                let live = self.load_live(&file.file_id, path).await?;
                Ok(VfsStat {
                    is_file: true,
                    is_directory: false,
                    size: stored_size(&live.content, file.is_binary),
                    created_at: node.created_at,
                    updated_at: node.updated_at,
                    is_binary: file.is_binary,
                    mime: file.mime.clone(),
                })
            }
        }
    }

    /// True if an active node lives at the path. The root always exists.
    pub async fn exists(&self, path: &str) -> VfsResult<bool> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "exists");
        self.locked(self.exists_locked(&resolved)).await
    }

    async fn exists_locked(&self, path: &str) -> VfsResult<bool> {
        let tree = self.load_tree().await?;
        Ok(tree.lookup(path).is_some_and(|id| !tree.node(id).deleted))
    }
}

/// An active directory at a path.
fn active_dir(tree: &VfsTree, path: &str) -> VfsResult<NodeId> {
    let id = find(tree, path)?;
    let node = tree.node(id);
    if !node.is_dir() {
        return Err(VfsError::not_a_directory(path));
    }
    if node.deleted {
        return Err(VfsError::is_deleted(path));
    }
    Ok(id)
}
