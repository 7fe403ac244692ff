//! Overlapping operations on one project must neither lose updates nor
//! reorder.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use kura_kernel::Vfs;

#[tokio::test]
async fn parallel_deletes_lose_nothing() {
    let vfs = Vfs::in_memory();
    let p = vfs.project("p");
    for i in 0..5 {
        p.create_file(&format!("/f{i}.txt"), "x").await.unwrap();
    }

    let paths: Vec<String> = (0..5).map(|i| format!("/f{i}.txt")).collect();
    let results = join_all(paths.iter().map(|path| p.delete_file(path))).await;
    assert!(results.iter().all(Result::is_ok));

    assert!(p.read_dir("/", false).await.unwrap().is_empty());
    assert_eq!(p.read_dir("/", true).await.unwrap().len(), 5);
}

#[tokio::test]
async fn queued_writes_apply_in_submission_order() {
    let vfs = Vfs::in_memory();
    let p = vfs.project("p");

    let contents: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    let results = join_all(contents.iter().map(|c| p.write_file("/log", c.as_str()))).await;
    let versions: Vec<u64> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(versions, (1..=10).collect::<Vec<_>>());

    for version in 1..=10u64 {
        let content = p.get_version("/log", version).await.unwrap();
        assert_eq!(content, (version - 1).to_string());
    }
}

#[tokio::test]
async fn lock_grants_in_submission_order() {
    let vfs = Vfs::in_memory();
    let order = Arc::new(Mutex::new(Vec::new()));

    let tasks = (0..10).map(|i| {
        let order = order.clone();
        vfs.locks().with_tree_lock("p", async move {
            tokio::time::sleep(Duration::from_millis(1)).await;
            order.lock().unwrap().push(i);
        })
    });
    join_all(tasks).await;

    assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn other_projects_are_not_blocked() {
    let vfs = Vfs::in_memory();
    let _held = vfs.locks().acquire("busy").await;

    let done = tokio::time::timeout(
        Duration::from_millis(500),
        vfs.project("free").create_file("/f", "x"),
    )
    .await;
    assert!(done.unwrap().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn spawned_creates_all_land() {
    let vfs = Arc::new(Vfs::in_memory());

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let vfs = vfs.clone();
            tokio::spawn(async move {
                vfs.project("p")
                    .create_file(&format!("/dir/f{i:02}.txt"), format!("{i}"))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = vfs.project("p").read_dir("/dir", false).await.unwrap();
    assert_eq!(entries.len(), 20);
}

#[tokio::test]
async fn failed_operation_releases_the_lock() {
    let vfs = Vfs::in_memory();
    let p = vfs.project("p");

    assert!(p.read_file("/missing").await.is_err());
    assert!(!vfs.locks().is_locked("p"));
    p.create_file("/f", "x").await.unwrap();
}
