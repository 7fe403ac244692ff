//! Orphaned file lineages.
//!
//! A lineage becomes an orphan when a rename or a content-type change
//! pushes it out of the tree. Its live record and version history stay in
//! storage until it is restored to a path or purged.

use kura_types::{ErrorCode, OrphanInfo, VfsError, VfsResult};

use crate::paths::{basename, parent_dir};
use crate::store::now_ms;
use crate::tree::FileNode;
use crate::vfs::{Project, displace};

impl Project<'_> {
    /// The project's orphan list, oldest first.
    pub async fn list_orphans(&self) -> VfsResult<Vec<OrphanInfo>> {
        tracing::debug!(project = %self.id(), "list_orphans");
        self.locked(async {
            let tree = self.load_tree().await?;
            Ok::<_, VfsError>(tree.orphans().to_vec())
        })
        .await
    }

    /// Give an orphan a path again, with its history intact.
    ///
    /// A soft-deleted node at the target is discarded along with its
    /// content.
    pub async fn restore_orphan(&self, file_id: &str, target: &str) -> VfsResult<()> {
        let resolved = self.resolve(target);
        tracing::debug!(project = %self.id(), file_id, path = %resolved, "restore_orphan");
        if basename(&resolved).is_empty() {
            return Err(VfsError::invalid_path("cannot restore an orphan to the root"));
        }
        self.check_writable(target)?;
        self.locked(self.restore_orphan_locked(file_id, &resolved)).await
    }

    async fn restore_orphan_locked(&self, file_id: &str, path: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        if !tree.has_orphan(file_id) {
            return Err(unknown_orphan(file_id));
        }

        let displaced = match tree.lookup(path) {
            Some(id) if !tree.node(id).deleted => {
                return Err(VfsError::new(
                    ErrorCode::DestinationExists,
                    format!("destination exists: {path}"),
                ));
            }
            Some(id) => displace(&mut tree, id),
            None => Vec::new(),
        };

        let now = now_ms();
        let parent = tree
            .ensure_parent_exists(path, now)
            .ok_or_else(|| VfsError::not_a_directory(&parent_dir(path)))?;
        let entry = tree.take_orphan(file_id).ok_or_else(|| unknown_orphan(file_id))?;
        tree.insert_file(
            parent,
            &basename(path),
            FileNode {
                file_id: entry.file_id,
                is_binary: entry.is_binary,
                mime: entry.mime,
            },
            now,
        );
        self.save_tree(&tree).await?;
        tracing::info!(project = %self.id(), file_id, path, from = %entry.original_path, "restored orphan");
        self.purge_content(&displaced).await
    }

    /// Permanently delete an orphan's content and history.
    pub async fn purge_orphan(&self, file_id: &str) -> VfsResult<()> {
        tracing::debug!(project = %self.id(), file_id, "purge_orphan");
        self.locked(self.purge_orphan_locked(file_id)).await
    }

    async fn purge_orphan_locked(&self, file_id: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let entry = tree.take_orphan(file_id).ok_or_else(|| unknown_orphan(file_id))?;
        self.save_tree(&tree).await?;
        tracing::info!(project = %self.id(), file_id, path = %entry.original_path, "purging orphan");
        self.purge_content(&[entry.file_id]).await
    }
}

fn unknown_orphan(file_id: &str) -> VfsError {
    VfsError::new(ErrorCode::PathNotFound, format!("no orphan with file id {file_id}"))
}
