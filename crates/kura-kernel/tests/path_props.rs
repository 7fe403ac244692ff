//! Property tests for path normalization and namespace resolution.

use kura_kernel::paths::{SHARE, SHARE_RW, is_under, normalize_path, resolve_namespaced_path};
use proptest::prelude::*;

fn raw_path() -> impl Strategy<Value = String> {
    "[a-c./ ]{0,24}"
}

proptest! {
    #[test]
    fn normalize_is_idempotent(path in raw_path()) {
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once.clone());
    }

    #[test]
    fn normalized_paths_are_canonical(path in raw_path()) {
        let normalized = normalize_path(&path);
        prop_assert!(normalized.starts_with('/'));
        prop_assert!(!normalized.contains("//"));
        prop_assert!(normalized == "/" || !normalized.ends_with('/'));
        prop_assert!(!normalized.split('/').any(|s| s == "." || s == ".."));
    }

    #[test]
    fn namespace_confines_everything_but_shared_mounts(path in raw_path()) {
        let resolved = resolve_namespaced_path(&path, Some("/team"));
        let normalized = normalize_path(&path);
        let shared = is_under(&normalized, SHARE) || is_under(&normalized, SHARE_RW);
        prop_assert!(shared || is_under(&resolved, "/team"), "{} escaped to {}", path, resolved);
    }
}
