//! Namespaces, shared mounts, and mount-root protection.

use kura_kernel::{ErrorCode, Vfs};
use rstest::rstest;

#[tokio::test]
async fn namespaced_paths_land_under_the_namespace() {
    let vfs = Vfs::in_memory();
    let team = vfs.project("p").with_namespace("/team");
    let root = vfs.project("p");

    team.create_file("/notes.md", "hello").await.unwrap();
    assert_eq!(root.read_file("/team/notes.md").await.unwrap().content, "hello");
    assert_eq!(team.read_file("/notes.md").await.unwrap().content, "hello");
}

#[tokio::test]
async fn traversal_cannot_escape_the_namespace() {
    let vfs = Vfs::in_memory();
    let team = vfs.project("p").with_namespace("team");
    let root = vfs.project("p");

    team.create_file("../../escape.txt", "x").await.unwrap();
    assert!(root.exists("/team/escape.txt").await.unwrap());
    assert!(!root.exists("/escape.txt").await.unwrap());
}

#[tokio::test]
async fn share_is_readable_but_not_writable_from_a_namespace() {
    let vfs = Vfs::in_memory();
    let root = vfs.project("p");
    let team = vfs.project("p").with_namespace("/team");
    root.create_file("/share/guide.md", "read me").await.unwrap();

    assert_eq!(team.read_file("/share/guide.md").await.unwrap().content, "read me");

    let err = team.write_file("/share/new.md", "x").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Readonly);
    let err = team.update_file("/share/guide.md", "x").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Readonly);
    let err = team.delete_file("/share/guide.md").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Readonly);
    let err = team.rename("/notes.md", "/share/notes.md").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Readonly);

    // Without a namespace the mount is writable.
    root.update_file("/share/guide.md", "v2").await.unwrap();
}

#[tokio::test]
async fn sharerw_is_writable_from_a_namespace() {
    let vfs = Vfs::in_memory();
    let team = vfs.project("p").with_namespace("/team");
    let other = vfs.project("p").with_namespace("/other");

    team.write_file("/sharerw/board.md", "todo").await.unwrap();
    assert_eq!(other.read_file("/sharerw/board.md").await.unwrap().content, "todo");
    assert!(!vfs.project("p").exists("/team/sharerw").await.unwrap());
}

#[rstest]
#[case::no_namespace(None)]
#[case::namespaced(Some("/team"))]
#[case::blank_namespace(Some("  "))]
#[tokio::test]
async fn mount_root_cannot_be_deleted_or_moved(#[case] namespace: Option<&str>) {
    let vfs = Vfs::in_memory();
    vfs.project("p").mkdir("/share").await.unwrap();

    let project = match namespace {
        Some(ns) => vfs.project("p").with_namespace(ns),
        None => vfs.project("p"),
    };

    let err = project.delete_file("/share").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    let err = project.rename("/share", "/elsewhere").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);
    let err = project.rmdir("/share", true).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPath);

    assert!(vfs.project("p").exists("/share").await.unwrap());
}
