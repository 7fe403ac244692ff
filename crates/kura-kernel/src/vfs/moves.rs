//! Moving nodes between paths and through the delete lifecycle.

use kura_types::{ErrorCode, VfsError, VfsResult};

use super::{Project, find, orphan_subtree};
use crate::paths::{basename, is_under, parent_dir};
use crate::store::now_ms;

impl Project<'_> {
    /// Move a node to a new path.
    ///
    /// An active node at the destination is an error. A soft-deleted one is
    /// displaced: every file lineage beneath it goes to the orphan list.
    /// Renaming a path onto itself does nothing.
    pub async fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let source = self.resolve(from);
        let dest = self.resolve(to);
        tracing::debug!(project = %self.id(), from = %source, to = %dest, "rename");
        Self::check_removable(&source)?;
        Self::check_removable(&dest)?;
        self.check_writable(from)?;
        self.check_writable(to)?;
        self.locked(self.rename_locked(&source, &dest)).await
    }

    async fn rename_locked(&self, from: &str, to: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let id = find(&tree, from)?;
        if tree.node(id).deleted {
            return Err(VfsError::is_deleted(from));
        }
        if from == to {
            return Ok(());
        }
        if is_under(to, from) {
            return Err(VfsError::invalid_path(format!(
                "cannot move {from} into itself ({to})"
            )));
        }

        let now = now_ms();
        if let Some(existing) = tree.lookup(to) {
            if !tree.node(existing).deleted {
                return Err(VfsError::new(
                    ErrorCode::DestinationExists,
                    format!("destination exists: {to}"),
                ));
            }
            let orphaned = orphan_subtree(&mut tree, existing, now);
            tracing::debug!(path = to, orphaned, "displaced deleted destination");
            tree.detach(existing);
        }

        let parent = tree
            .ensure_parent_exists(to, now)
            .ok_or_else(|| VfsError::not_a_directory(&parent_dir(to)))?;
        tree.detach(id);
        if !tree.attach(id, parent, &basename(to)) {
            return Err(VfsError::invalid_path(format!("cannot move {from} to {to}")));
        }
        tree.node_mut(id).updated_at = now;
        self.save_tree(&tree).await
    }

    /// Undo a soft delete. The node's deleted ancestors come back with it;
    /// its descendants do not. Restoring an active node does nothing.
    pub async fn restore(&self, path: &str) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "restore");
        self.check_writable(path)?;
        self.locked(self.restore_locked(&resolved)).await
    }

    async fn restore_locked(&self, path: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let id = find(&tree, path)?;
        if !tree.node(id).deleted {
            return Ok(());
        }
        let now = now_ms();
        let node = tree.node_mut(id);
        node.deleted = false;
        node.updated_at = now;
        tree.resurrect_ancestors(id, now);
        self.save_tree(&tree).await
    }

    /// Permanently remove a soft-deleted node, its subtree, and all of
    /// their content and history.
    pub async fn purge(&self, path: &str) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "purge");
        Self::check_removable(&resolved)?;
        self.check_writable(path)?;
        self.locked(self.purge_locked(&resolved)).await
    }

    async fn purge_locked(&self, path: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let id = find(&tree, path)?;
        if !tree.node(id).deleted {
            return Err(VfsError::invalid_path(format!(
                "only deleted nodes can be purged: {path}"
            )));
        }

        let file_ids = tree.file_ids_in(id);
        tree.detach(id);
        self.save_tree(&tree).await?;
        tracing::info!(project = %self.id(), path, files = file_ids.len(), "purged node");
        self.purge_content(&file_ids).await
    }

    /// Delete everything the project owns: its tree, every file record,
    /// every version, and every orphan.
    pub async fn purge_project(&self) -> VfsResult<()> {
        tracing::debug!(project = %self.id(), "purge_project");
        self.locked(self.purge_project_locked()).await
    }

    async fn purge_project_locked(&self) -> VfsResult<()> {
        let tree = self.load_tree().await?;
        let mut file_ids = tree.all_file_ids();
        file_ids.extend(tree.orphans().iter().map(|o| o.file_id.clone()));

        self.store().delete_tree(self.id()).await?;
        for file_id in &file_ids {
            self.store().delete_file_content(file_id).await?;
        }
        let records = self.store().delete_project_files(self.id()).await?;
        tracing::info!(project = %self.id(), files = file_ids.len(), records, "purged project");
        Ok(())
    }
}
