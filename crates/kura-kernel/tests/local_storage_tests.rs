//! The engine over the directory-backed store.

use std::sync::Arc;

use kura_kernel::{LocalStorage, PlainCodec, Vfs};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Vfs {
    Vfs::new(Arc::new(LocalStorage::new(dir.path())), Arc::new(PlainCodec))
}

#[tokio::test]
async fn state_survives_reopening() {
    let dir = TempDir::new().unwrap();
    {
        let vfs = open(&dir);
        let p = vfs.project("p");
        p.create_file("/docs/readme.md", "one").await.unwrap();
        p.update_file("/docs/readme.md", "two").await.unwrap();
        p.write_file("/docs/logo.gif", b"GIF89a\x01\x00".to_vec()).await.unwrap();
    }

    let vfs = open(&dir);
    let p = vfs.project("p");
    assert_eq!(p.read_file("/docs/readme.md").await.unwrap().content, "two");
    assert_eq!(p.list_versions("/docs/readme.md").await.unwrap().len(), 2);
    assert_eq!(p.get_version("/docs/readme.md", 1).await.unwrap(), "one");

    let logo = p.read_file("/docs/logo.gif").await.unwrap();
    assert_eq!(logo.mime, "image/gif");
    assert_eq!(logo.buffer.as_deref(), Some(&b"GIF89a\x01\x00"[..]));
}

#[tokio::test]
async fn purge_project_clears_the_directory_records() {
    let dir = TempDir::new().unwrap();
    let vfs = open(&dir);
    let p = vfs.project("p");
    p.create_file("/a", "a").await.unwrap();
    p.update_file("/a", "b").await.unwrap();

    p.purge_project().await.unwrap();

    for table in ["vfs_trees", "vfs_files", "vfs_versions"] {
        let table_dir = dir.path().join(table);
        let remaining = std::fs::read_dir(&table_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(remaining, 0, "{table} still has records");
    }
}
