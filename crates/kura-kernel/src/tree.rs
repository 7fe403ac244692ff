//! In-memory project tree.
//!
//! The persisted document is a nest of name → node maps. In memory it is an
//! arena: every node lives in one `Vec`, addressed by [`NodeId`], and knows
//! its parent. Directories map child names to ids.
//!
//! ```text
//! nodes[0]  /            Dir { "a" → 1, "notes.md" → 3 }
//! nodes[1]  /a           Dir { "b.txt" → 2 }      parent 0
//! nodes[2]  /a/b.txt     File                     parent 1
//! nodes[3]  /notes.md    File                     parent 0
//! ```
//!
//! Detaching a node unlinks it from its parent; the slot stays in the arena
//! until the tree is dropped, but nothing reachable from the root points at
//! it, so it never reaches storage. A node can only be attached under a
//! directory that is not its own descendant, so cycles cannot form.

use std::collections::BTreeMap;

use kura_types::{NodeRecord, OrphanEntry, Timestamp, TreeDocument};

use crate::paths::{join_path, path_segments};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// File payload: which content lineage the node points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub file_id: String,
    pub is_binary: bool,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File(FileNode),
    Dir { children: BTreeMap<String, NodeId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub kind: NodeKind,
}

impl Node {
    fn dir(name: &str, parent: Option<NodeId>, now: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            parent,
            deleted: false,
            created_at: now,
            updated_at: now,
            kind: NodeKind::Dir {
                children: BTreeMap::new(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir { .. })
    }

    pub fn file(&self) -> Option<&FileNode> {
        match &self.kind {
            NodeKind::File(file) => Some(file),
            NodeKind::Dir { .. } => None,
        }
    }

    fn children(&self) -> Option<&BTreeMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Dir { children } => Some(children),
            NodeKind::File(_) => None,
        }
    }

    fn mark(&mut self, deleted: bool, now: Timestamp) -> bool {
        if self.deleted == deleted {
            return false;
        }
        self.deleted = deleted;
        self.updated_at = now;
        true
    }
}

/// A project's tree plus its orphan list.
#[derive(Debug, Clone)]
pub struct VfsTree {
    nodes: Vec<Node>,
    orphans: Vec<OrphanEntry>,
}

impl Default for VfsTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VfsTree {
    const ROOT: NodeId = NodeId(0);

    /// An empty tree: just the root directory.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::dir("", None, 0)],
            orphans: Vec::new(),
        }
    }

    /// Build the arena from a persisted document.
    pub fn from_document(doc: TreeDocument) -> Self {
        let mut tree = Self::new();
        tree.orphans = doc.orphans;

        let mut pending: Vec<(NodeId, String, NodeRecord)> = doc
            .children
            .into_iter()
            .map(|(name, record)| (Self::ROOT, name, record))
            .collect();

        while let Some((parent, name, record)) = pending.pop() {
            let (node, grandchildren) = match record {
                NodeRecord::File {
                    deleted,
                    created_at,
                    updated_at,
                    file_id,
                    is_binary,
                    mime,
                } => (
                    Node {
                        name: name.clone(),
                        parent: Some(parent),
                        deleted,
                        created_at,
                        updated_at,
                        kind: NodeKind::File(FileNode {
                            file_id,
                            is_binary,
                            mime,
                        }),
                    },
                    BTreeMap::new(),
                ),
                NodeRecord::Dir {
                    deleted,
                    created_at,
                    updated_at,
                    children,
                } => {
                    let mut node = Node::dir(&name, Some(parent), created_at);
                    node.deleted = deleted;
                    node.updated_at = updated_at;
                    (node, children)
                }
            };

            let id = tree.push(node);
            tree.link(parent, &name, id);
            pending.extend(
                grandchildren
                    .into_iter()
                    .map(|(child_name, child)| (id, child_name, child)),
            );
        }

        tree
    }

    /// Snapshot the reachable tree back into the persisted shape.
    pub fn to_document(&self) -> TreeDocument {
        TreeDocument {
            children: self.records_under(Self::ROOT),
            orphans: self.orphans.clone(),
        }
    }

    fn records_under(&self, dir: NodeId) -> BTreeMap<String, NodeRecord> {
        let Some(children) = self.node(dir).children() else {
            return BTreeMap::new();
        };
        children
            .iter()
            .map(|(name, &id)| (name.clone(), self.record(id)))
            .collect()
    }

    fn record(&self, id: NodeId) -> NodeRecord {
        let node = self.node(id);
        match &node.kind {
            NodeKind::File(file) => NodeRecord::File {
                deleted: node.deleted,
                created_at: node.created_at,
                updated_at: node.updated_at,
                file_id: file.file_id.clone(),
                is_binary: file.is_binary,
                mime: file.mime.clone(),
            },
            NodeKind::Dir { .. } => NodeRecord::Dir {
                deleted: node.deleted,
                created_at: node.created_at,
                updated_at: node.updated_at,
                children: self.records_under(id),
            },
        }
    }

    // ================================================================
    // Navigation
    // ================================================================

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Child of a directory by name. `None` for files and missing names.
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.node(dir).children()?.get(name).copied()
    }

    /// Children of a directory in name order. Empty for files.
    pub fn children(&self, dir: NodeId) -> Vec<(String, NodeId)> {
        self.node(dir)
            .children()
            .map(|c| c.iter().map(|(n, &id)| (n.clone(), id)).collect())
            .unwrap_or_default()
    }

    /// Find the node at a path, walking through deleted directories.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        path_segments(path)
            .iter()
            .try_fold(Self::ROOT, |dir, name| self.child(dir, name))
    }

    /// Tree path of a node, rebuilt from parent links.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            names.push(self.node(current).name.as_str());
            current = parent;
        }
        names.reverse();
        names
            .into_iter()
            .fold("/".to_string(), |dir, name| join_path(&dir, name))
    }

    /// The node and everything beneath it, parents before children.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(children) = self.node(current).children() {
                stack.extend(children.values().rev().copied());
            }
        }
        out
    }

    /// Every file id in a subtree.
    pub fn file_ids_in(&self, id: NodeId) -> Vec<String> {
        self.subtree(id)
            .into_iter()
            .filter_map(|n| self.node(n).file().map(|f| f.file_id.clone()))
            .collect()
    }

    /// Every file id reachable from the root.
    pub fn all_file_ids(&self) -> Vec<String> {
        self.file_ids_in(Self::ROOT)
    }

    /// True if `ancestor` is `id` or one of its parents.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// True if a directory holds at least one non-deleted child.
    pub fn has_active_children(&self, dir: NodeId) -> bool {
        self.node(dir)
            .children()
            .is_some_and(|c| c.values().any(|&id| !self.node(id).deleted))
    }

    // ================================================================
    // Mutation
    // ================================================================

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: NodeId, name: &str, id: NodeId) {
        if let NodeKind::Dir { children } = &mut self.node_mut(parent).kind {
            children.insert(name.to_string(), id);
        }
    }

    /// Create a new file node under a directory.
    pub fn insert_file(&mut self, parent: NodeId, name: &str, file: FileNode, now: Timestamp) -> NodeId {
        let id = self.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            deleted: false,
            created_at: now,
            updated_at: now,
            kind: NodeKind::File(file),
        });
        self.link(parent, name, id);
        id
    }

    /// Create a new, empty directory node.
    pub fn insert_dir(&mut self, parent: NodeId, name: &str, now: Timestamp) -> NodeId {
        let id = self.push(Node::dir(name, Some(parent), now));
        self.link(parent, name, id);
        id
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let name = self.node(id).name.clone();
        if let NodeKind::Dir { children } = &mut self.node_mut(parent).kind {
            children.remove(&name);
        }
        self.node_mut(id).parent = None;
    }

    /// Link a detached node under `parent` with a new name.
    ///
    /// Refuses (returns false) if `parent` is not a directory or lies inside
    /// the node's own subtree.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, name: &str) -> bool {
        if !self.node(parent).is_dir() || self.is_ancestor(id, parent) {
            return false;
        }
        let node = self.node_mut(id);
        node.parent = Some(parent);
        node.name = name.to_string();
        self.link(parent, name, id);
        true
    }

    /// Set `deleted` on every node of a subtree. Returns how many changed.
    pub fn mark_subtree(&mut self, id: NodeId, deleted: bool, now: Timestamp) -> usize {
        self.subtree(id)
            .into_iter()
            .filter(|&n| self.node_mut(n).mark(deleted, now))
            .count()
    }

    /// Clear `deleted` on a node's ancestors (not the node itself).
    pub fn resurrect_ancestors(&mut self, id: NodeId, now: Timestamp) {
        let mut current = self.node(id).parent;
        while let Some(dir) = current {
            self.node_mut(dir).mark(false, now);
            current = self.node(dir).parent;
        }
    }

    /// Walk the ancestry of `path`, creating missing directories and
    /// resurrecting soft-deleted ones. Returns the parent directory of the
    /// final segment, or `None` if some ancestor is a file.
    ///
    /// Files beneath a resurrected directory keep their own deleted flag.
    pub fn ensure_parent_exists(&mut self, path: &str, now: Timestamp) -> Option<NodeId> {
        let segments = path_segments(path);
        let Some((_, ancestors)) = segments.split_last() else {
            return Some(Self::ROOT);
        };

        let mut dir = Self::ROOT;
        for name in ancestors {
            dir = match self.child(dir, name) {
                Some(id) if self.node(id).is_dir() => {
                    self.node_mut(id).mark(false, now);
                    id
                }
                Some(_) => return None,
                None => self.insert_dir(dir, name, now),
            };
        }
        Some(dir)
    }

    // ================================================================
    // Orphans
    // ================================================================

    pub fn orphans(&self) -> &[OrphanEntry] {
        &self.orphans
    }

    pub fn push_orphan(&mut self, entry: OrphanEntry) {
        self.orphans.push(entry);
    }

    /// Remove and return the orphan entry for a file id.
    pub fn take_orphan(&mut self, file_id: &str) -> Option<OrphanEntry> {
        let idx = self.orphans.iter().position(|o| o.file_id == file_id)?;
        Some(self.orphans.remove(idx))
    }

    pub fn has_orphan(&self, file_id: &str) -> bool {
        self.orphans.iter().any(|o| o.file_id == file_id)
    }
}
