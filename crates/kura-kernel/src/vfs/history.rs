//! Version history: listing, retrieval, and pruning.
//!
//! A file at version N has its live content in the files table and one
//! snapshot per earlier version still retained:
//!
//! ```text
//! vfs_files     {fileId}        version N  (live)
//! vfs_versions  {fileId}_v{N-1} ..= {fileId}_v{minStoredVersion}
//! ```
//!
//! Path-based queries work on soft-deleted files too; by-id queries reach
//! orphaned lineages that no path points at anymore.

use kura_types::{ErrorCode, VersionInfo, VfsError, VfsResult};

use super::{Project, find};
use crate::tree::VfsTree;

impl Project<'_> {
    /// The file id behind a path, deleted or not.
    pub async fn file_id(&self, path: &str) -> VfsResult<String> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "file_id");
        self.locked(self.file_id_locked(&resolved)).await
    }

    async fn file_id_locked(&self, path: &str) -> VfsResult<String> {
        let tree = self.load_tree().await?;
        file_id_at(&tree, path)
    }

    /// Every retrievable version of a file, newest first.
    pub async fn list_versions(&self, path: &str) -> VfsResult<Vec<VersionInfo>> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "list_versions");
        self.locked(async {
            let file_id = self.file_id_locked(&resolved).await?;
            self.versions_of(&file_id).await
        })
        .await
    }

    /// Content of one version of a file. The current version reads the
    /// live record.
    pub async fn get_version(&self, path: &str, version: u64) -> VfsResult<String> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, version, "get_version");
        self.locked(async {
            let file_id = self.file_id_locked(&resolved).await?;
            self.version_of(&file_id, version).await
        })
        .await
    }

    /// Like [`list_versions`](Self::list_versions), by file id.
    pub async fn list_file_versions(&self, file_id: &str) -> VfsResult<Vec<VersionInfo>> {
        tracing::debug!(project = %self.id(), file_id, "list_file_versions");
        self.locked(async {
            self.check_owned(file_id).await?;
            self.versions_of(file_id).await
        })
        .await
    }

    /// Like [`get_version`](Self::get_version), by file id.
    pub async fn get_file_version(&self, file_id: &str, version: u64) -> VfsResult<String> {
        tracing::debug!(project = %self.id(), file_id, version, "get_file_version");
        self.locked(async {
            self.check_owned(file_id).await?;
            self.version_of(file_id, version).await
        })
        .await
    }

    /// Drop all but the newest `keep` snapshots of a file.
    pub async fn prune_versions(&self, path: &str, keep: u64) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, keep, "prune_versions");
        self.check_writable(path)?;
        self.locked(async {
            let file_id = self.file_id_locked(&resolved).await?;
            self.store().drop_old_versions(self.id(), &file_id, keep).await
        })
        .await
    }

    /// Fail unless the file id is reachable from this project's tree or
    /// orphan list.
    async fn check_owned(&self, file_id: &str) -> VfsResult<()> {
        let tree = self.load_tree().await?;
        if tree.has_orphan(file_id) || tree.all_file_ids().iter().any(|id| id == file_id) {
            Ok(())
        } else {
            Err(unknown_file(file_id))
        }
    }

    async fn versions_of(&self, file_id: &str) -> VfsResult<Vec<VersionInfo>> {
        let live = self
            .store()
            .load_file(file_id)
            .await?
            .ok_or_else(|| unknown_file(file_id))?;

        let mut versions = vec![VersionInfo {
            version: live.version,
            created_at: live.updated_at,
        }];
        for version in (live.min_version()..live.version).rev() {
            if let Some(snapshot) = self.store().load_version(file_id, version).await? {
                versions.push(VersionInfo {
                    version: snapshot.version,
                    created_at: snapshot.created_at,
                });
            }
        }
        Ok(versions)
    }

    async fn version_of(&self, file_id: &str, version: u64) -> VfsResult<String> {
        let live = self
            .store()
            .load_file(file_id)
            .await?
            .ok_or_else(|| unknown_file(file_id))?;
        if version == live.version {
            return Ok(live.content);
        }
        if version > live.version {
            return Err(missing_version(file_id, version));
        }
        self.store()
            .load_version(file_id, version)
            .await?
            .map(|snapshot| snapshot.content)
            .ok_or_else(|| missing_version(file_id, version))
    }
}

fn file_id_at(tree: &VfsTree, path: &str) -> VfsResult<String> {
    let id = find(tree, path)?;
    tree.node(id)
        .file()
        .map(|f| f.file_id.clone())
        .ok_or_else(|| VfsError::not_a_file(path))
}

fn unknown_file(file_id: &str) -> VfsError {
    VfsError::new(ErrorCode::PathNotFound, format!("no such file id: {file_id}"))
}

fn missing_version(file_id: &str, version: u64) -> VfsError {
    VfsError::new(
        ErrorCode::PathNotFound,
        format!("version {version} of {file_id} is not available"),
    )
}
