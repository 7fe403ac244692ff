//! Path normalization and namespace policy.
//!
//! Every VFS path is absolute, slash-separated, and normalized before it
//! touches the tree:
//!
//! ```text
//! ""              → /
//! "a//b/./c/"     → /a/b/c
//! "/a/../../b"    → /b
//! ```
//!
//! Namespaces prefix every path a caller supplies, except the shared mounts:
//!
//! ```text
//! namespace "/team"   "/notes.md"       → /team/notes.md
//!                     "/share/guide.md" → /share/guide.md    (read-only)
//!                     "/sharerw/x.txt"  → /sharerw/x.txt     (writable)
//! ```

/// Global shared mount, read-only for namespaced callers.
pub const SHARE: &str = "/share";

/// Global shared mount, writable by everyone.
pub const SHARE_RW: &str = "/sharerw";

/// Structural roots that can never be deleted or renamed.
pub const MOUNT_ROOTS: &[&str] = &[SHARE];

/// Normalize a path: resolve `.` and `..`, collapse repeated slashes,
/// force one leading slash, strip the trailing one.
pub fn normalize_path(path: &str) -> String {
    if path.trim().is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Segments of a normalized path. The root has none.
pub fn path_segments(path: &str) -> Vec<String> {
    normalize_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_root_path(path: &str) -> bool {
    normalize_path(path) == "/"
}

/// Parent directory of a path. The parent of `/` is `/`.
pub fn parent_dir(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Final segment of a path. Empty for `/`.
pub fn basename(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

/// Join a normalized directory and a child name.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True if `path` is `root` or lies beneath it. Both must be normalized.
pub fn is_under(path: &str, root: &str) -> bool {
    if root == "/" {
        return true;
    }
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn active_namespace(namespace: Option<&str>) -> Option<String> {
    namespace
        .filter(|ns| !ns.trim().is_empty())
        .map(normalize_path)
}

/// Resolve a caller path into the tree path it addresses.
///
/// Both sides are normalized before they are joined, so `..` in the caller
/// path cannot climb out of the namespace.
pub fn resolve_namespaced_path(path: &str, namespace: Option<&str>) -> String {
    let normalized = normalize_path(path);
    let Some(ns) = active_namespace(namespace) else {
        return normalized;
    };

    if is_under(&normalized, SHARE) || is_under(&normalized, SHARE_RW) {
        return normalized;
    }

    match (ns.as_str(), normalized.as_str()) {
        ("/", _) => normalized,
        (_, "/") => ns,
        _ => format!("{ns}{normalized}"),
    }
}

/// True when a namespaced caller addresses the read-only shared mount.
///
/// Checked against the caller's path, before namespace resolution.
pub fn is_namespaced_readonly(path: &str, namespace: Option<&str>) -> bool {
    active_namespace(namespace).is_some() && is_under(&normalize_path(path), SHARE)
}

/// True if a resolved path is one of the structural mount roots.
pub fn is_mount_root(resolved: &str) -> bool {
    MOUNT_ROOTS.contains(&resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_forms() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("   "), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("a/b"), "/a/b");
        assert_eq!(normalize_path("//a///b//"), "/a/b");
        assert_eq!(normalize_path("/a/./b/../c"), "/a/c");
        assert_eq!(normalize_path("/../../x"), "/x");
        assert_eq!(normalize_path("/a/.."), "/");
    }

    #[test]
    fn names_keep_inner_spaces() {
        assert_eq!(normalize_path("/my notes/a b.txt"), "/my notes/a b.txt");
    }

    #[test]
    fn parent_and_basename() {
        assert_eq!(parent_dir("/a/b/c.txt"), "/a/b");
        assert_eq!(parent_dir("/a"), "/");
        assert_eq!(parent_dir("/"), "/");
        assert_eq!(basename("/a/b/c.txt"), "c.txt");
        assert_eq!(basename("/a/"), "a");
        assert_eq!(basename("/"), "");
    }

    #[test]
    fn segments() {
        assert_eq!(path_segments("/a/b/c"), vec!["a", "b", "c"]);
        assert!(path_segments("/").is_empty());
        assert!(is_root_path("/./"));
        assert!(!is_root_path("/a"));
    }

    #[test]
    fn is_under_respects_segment_boundaries() {
        assert!(is_under("/share", "/share"));
        assert!(is_under("/share/x", "/share"));
        assert!(!is_under("/shared", "/share"));
        assert!(!is_under("/sharerw/x", "/share"));
        assert!(is_under("/anything", "/"));
    }

    #[test]
    fn namespace_prefixes_private_paths() {
        assert_eq!(resolve_namespaced_path("/a.txt", None), "/a.txt");
        assert_eq!(resolve_namespaced_path("/a.txt", Some("team")), "/team/a.txt");
        assert_eq!(resolve_namespaced_path("/", Some("/team/")), "/team");
        assert_eq!(resolve_namespaced_path("/a", Some("")), "/a");
    }

    #[test]
    fn namespace_cannot_be_escaped() {
        assert_eq!(
            resolve_namespaced_path("/../../etc/passwd", Some("/team")),
            "/team/etc/passwd"
        );
        assert_eq!(resolve_namespaced_path("..", Some("/team")), "/team");
    }

    #[test]
    fn shared_mounts_bypass_namespace() {
        assert_eq!(resolve_namespaced_path("/share/a", Some("/team")), "/share/a");
        assert_eq!(resolve_namespaced_path("/sharerw", Some("/team")), "/sharerw");
        assert_eq!(resolve_namespaced_path("/shared", Some("/team")), "/team/shared");
    }

    #[test]
    fn readonly_only_under_share_with_namespace() {
        assert!(is_namespaced_readonly("/share", Some("t")));
        assert!(is_namespaced_readonly("/share/x/y", Some("t")));
        assert!(is_namespaced_readonly("/x/../share/y", Some("t")));
        assert!(!is_namespaced_readonly("/share/x", None));
        assert!(!is_namespaced_readonly("/sharerw/x", Some("t")));
        assert!(!is_namespaced_readonly("/shared", Some("t")));
    }

    #[test]
    fn mount_roots() {
        assert!(is_mount_root("/share"));
        assert!(!is_mount_root("/share/x"));
        assert!(!is_mount_root("/sharerw"));
    }
}
