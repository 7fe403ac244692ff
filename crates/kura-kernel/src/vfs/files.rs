//! File operations: create, read, update, write, delete, and text edits.

use kura_types::{InsertResult, ReadFileResult, StrReplaceResult, VfsError, VfsFile, VfsResult};

use super::{Project, active_file, displace, find, orphan_subtree};
use crate::content::{FileContent, decode_binary};
use crate::edit::{insert_lines, line_span, replace_unique, snippet};
use crate::paths::{basename, parent_dir};
use crate::store::now_ms;
use crate::tree::VfsTree;

impl Project<'_> {
    /// Create a new file at version 1, creating missing parent directories.
    ///
    /// A soft-deleted node at the path is replaced and its content purged.
    pub async fn create_file(&self, path: &str, content: impl Into<FileContent>) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "create_file");
        self.check_writable(path)?;
        let content = content.into();
        self.locked(self.create_file_locked(&resolved, &content)).await
    }

    async fn create_file_locked(&self, path: &str, content: &FileContent) -> VfsResult<()> {
        let name = basename(path);
        if name.is_empty() {
            return Err(VfsError::invalid_path("a file path needs a name"));
        }

        let mut tree = self.load_tree().await?;
        let displaced = match tree.lookup(path) {
            Some(id) if !tree.node(id).deleted => return Err(VfsError::file_exists(path)),
            Some(id) => displace(&mut tree, id),
            None => Vec::new(),
        };

        self.insert_new_file(&mut tree, path, &name, content).await?;
        self.save_tree(&tree).await?;
        self.purge_content(&displaced).await
    }

    /// Attach a fresh lineage at `path`. The path must be free.
    async fn insert_new_file(
        &self,
        tree: &mut VfsTree,
        path: &str,
        name: &str,
        content: &FileContent,
    ) -> VfsResult<()> {
        let now = now_ms();
        let parent = tree
            .ensure_parent_exists(path, now)
            .ok_or_else(|| VfsError::not_a_directory(&parent_dir(path)))?;
        let file = self.create_lineage(content, now).await?;
        tree.insert_file(parent, name, file, now);
        Ok(())
    }

    /// Current content of an active file.
    pub async fn read_file(&self, path: &str) -> VfsResult<ReadFileResult> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "read_file");
        self.locked(self.read_file_locked(&resolved)).await
    }

    async fn read_file_locked(&self, path: &str) -> VfsResult<ReadFileResult> {
        let tree = self.load_tree().await?;
        let (_, file) = active_file(&tree, path)?;
        let live = self.load_live(&file.file_id, path).await?;
        let buffer = if file.is_binary {
            Some(decode_binary(&live.content)?)
        } else {
            None
        };
        Ok(ReadFileResult {
            content: live.content,
            is_binary: file.is_binary,
            mime: file.mime,
            buffer,
        })
    }

    /// Replace the text of an active file. Returns the new version.
    pub async fn update_file(&self, path: &str, text: &str) -> VfsResult<u64> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "update_file");
        self.check_writable(path)?;
        let (file, ()) = self
            .locked(self.rewrite_text(&resolved, |_| Ok((text.to_string(), ()))))
            .await?;
        Ok(file.version)
    }

    /// Create or overwrite a file with text or binary content.
    ///
    /// Writing onto a soft-deleted file brings it back. When the content
    /// type changes (binary flag or MIME) the old lineage is orphaned and a
    /// new one starts at version 1. Returns the resulting version.
    pub async fn write_file(&self, path: &str, content: impl Into<FileContent>) -> VfsResult<u64> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "write_file");
        self.check_writable(path)?;
        let content = content.into();
        self.locked(self.write_file_locked(&resolved, &content)).await
    }

    async fn write_file_locked(&self, path: &str, content: &FileContent) -> VfsResult<u64> {
        let name = basename(path);
        if name.is_empty() {
            return Err(VfsError::invalid_path("a file path needs a name"));
        }

        let now = now_ms();
        let mut tree = self.load_tree().await?;
        let mut displaced = Vec::new();

        if let Some(id) = tree.lookup(path) {
            let deleted = tree.node(id).deleted;
            match tree.node(id).file().cloned() {
                None if !deleted => return Err(VfsError::not_a_file(path)),
                None => displaced = displace(&mut tree, id),
                Some(file) if file.is_binary == content.is_binary() && file.mime == content.mime() => {
                    let live = self.load_live(&file.file_id, path).await?;
                    let live = self
                        .commit_version(&file.file_id, live, content.encode(), now)
                        .await?;
                    let node = tree.node_mut(id);
                    node.deleted = false;
                    node.updated_at = now;
                    tree.resurrect_ancestors(id, now);
                    self.save_tree(&tree).await?;
                    return Ok(live.version);
                }
                Some(file) => {
                    tracing::debug!(
                        path,
                        from = %file.mime,
                        to = content.mime(),
                        "content type changed, starting a new lineage"
                    );
                    orphan_subtree(&mut tree, id, now);
                    tree.detach(id);
                }
            }
        }

        self.insert_new_file(&mut tree, path, &name, content).await?;
        self.save_tree(&tree).await?;
        self.purge_content(&displaced).await?;
        Ok(1)
    }

    /// Soft-delete a file. Deleting an already deleted file is a no-op.
    pub async fn delete_file(&self, path: &str) -> VfsResult<()> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "delete_file");
        Self::check_removable(&resolved)?;
        self.check_writable(path)?;
        self.locked(self.delete_file_locked(&resolved)).await
    }

    async fn delete_file_locked(&self, path: &str) -> VfsResult<()> {
        let mut tree = self.load_tree().await?;
        let id = find(&tree, path)?;
        if tree.node(id).is_dir() {
            return Err(VfsError::not_a_file(path));
        }
        if tree.mark_subtree(id, true, now_ms()) > 0 {
            self.save_tree(&tree).await?;
        }
        Ok(())
    }

    /// Replace the single occurrence of `old_str` with `new_str`.
    pub async fn str_replace(&self, path: &str, old_str: &str, new_str: &str) -> VfsResult<StrReplaceResult> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, "str_replace");
        self.check_writable(path)?;
        let (file, line) = self
            .locked(self.rewrite_text(&resolved, |content| {
                replace_unique(content, old_str, new_str, &resolved)
            }))
            .await?;
        Ok(StrReplaceResult {
            version: file.version,
            line,
            snippet: snippet(&file.content, line, line_span(new_str)),
        })
    }

    /// Insert `text` at a 0-indexed line boundary.
    pub async fn insert(&self, path: &str, insert_line: usize, text: &str) -> VfsResult<InsertResult> {
        let resolved = self.resolve(path);
        tracing::debug!(project = %self.id(), path = %resolved, insert_line, "insert");
        self.check_writable(path)?;
        let (file, ()) = self
            .locked(self.rewrite_text(&resolved, |content| {
                insert_lines(content, insert_line, text, &resolved).map(|c| (c, ()))
            }))
            .await?;
        Ok(InsertResult {
            version: file.version,
            snippet: snippet(&file.content, insert_line + 1, line_span(text)),
        })
    }

    /// Load an active text file, apply `edit`, and commit the result as the
    /// next version.
    async fn rewrite_text<T>(
        &self,
        path: &str,
        edit: impl FnOnce(&str) -> VfsResult<(String, T)>,
    ) -> VfsResult<(VfsFile, T)> {
        let mut tree = self.load_tree().await?;
        let (id, file) = active_file(&tree, path)?;
        if file.is_binary {
            return Err(VfsError::binary_file(path));
        }

        let live = self.load_live(&file.file_id, path).await?;
        let (content, extra) = edit(&live.content)?;
        let now = now_ms();
        let live = self.commit_version(&file.file_id, live, content, now).await?;

        tree.node_mut(id).updated_at = now;
        self.save_tree(&tree).await?;
        Ok((live, extra))
    }
}
