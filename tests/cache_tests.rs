//! Integration tests for parse coalescing, retry, and invalidation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use emlvfs::config::Config;
use emlvfs::store::{EmailCache, Lookup};
use emlvfs::vfs::{EmailFileSystem, FileChangeType, FileSystemProvider, LocalWorkspace, VirtualUri};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn mail_root(tmp: &tempfile::TempDir) -> PathBuf {
    let root = tmp.path().join("mail");
    std::fs::create_dir_all(&root).unwrap();
    root
}

#[tokio::test]
async fn test_concurrent_gets_parse_once() {
    let tmp = tempfile::tempdir().unwrap();
    let path = mail_root(&tmp).join("inbox.eml");
    std::fs::copy(fixture("inbox.eml"), &path).unwrap();

    let cache = EmailCache::default();
    let lookups = futures::future::join_all((0..16).map(|_| cache.get(&path))).await;

    let emails: Vec<_> = lookups
        .into_iter()
        .map(|lookup| match lookup.unwrap() {
            Lookup::Parsed(email) => email,
            Lookup::Unsupported(kind) => panic!("unexpected unsupported kind {kind}"),
        })
        .collect();
    assert_eq!(cache.stats().parses(), 1);
    assert!(emails.iter().all(|e| Arc::ptr_eq(e, &emails[0])));
    assert_eq!(
        cache.stats().hits() + cache.stats().coalesced(),
        15,
        "every other caller either waited or hit"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_across_tasks_parse_once() {
    let tmp = tempfile::tempdir().unwrap();
    let root = mail_root(&tmp);
    std::fs::copy(fixture("inbox.eml"), root.join("inbox.eml")).unwrap();
    let fs = Arc::new(EmailFileSystem::new(
        Arc::new(LocalWorkspace::new(&root)),
        &Config::default(),
    ));

    let mut handles = Vec::new();
    for i in 0..12 {
        let fs = Arc::clone(&fs);
        handles.push(tokio::spawn(async move {
            let uri = VirtualUri::parse("eml:/mail/inbox.eml").unwrap();
            match i % 3 {
                0 => fs.stat(&uri).await.size,
                1 => fs.read_directory(&uri).await.unwrap().len() as u64,
                _ => fs.read_file(&uri.join("report.pdf")).await.unwrap().len() as u64,
            }
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap() > 0);
    }
    assert_eq!(fs.cache().stats().parses(), 1);
}

#[tokio::test]
async fn test_parse_failure_is_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let root = mail_root(&tmp);
    let path = root.join("inbox.eml");
    std::fs::copy(fixture("duplicate.eml"), &path).unwrap();
    let fs = EmailFileSystem::new(Arc::new(LocalWorkspace::new(&root)), &Config::default());
    let container = VirtualUri::parse("eml:/mail/inbox.eml").unwrap();

    assert!(fs.read_directory(&container).await.is_err());
    assert!(fs.cache().is_empty());

    // The source gets fixed; nothing negative was remembered.
    std::fs::copy(fixture("inbox.eml"), &path).unwrap();
    let entries = fs.read_directory(&container).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(fs.cache().stats().parses(), 2);
    assert_eq!(fs.cache().stats().failures(), 1);
}

#[tokio::test]
async fn test_modified_container_is_reparsed_and_announced() {
    let tmp = tempfile::tempdir().unwrap();
    let root = mail_root(&tmp);
    let path = root.join("inbox.eml");
    std::fs::copy(fixture("inbox.eml"), &path).unwrap();
    let fs = EmailFileSystem::new(Arc::new(LocalWorkspace::new(&root)), &Config::default());
    let mut events = fs.subscribe();
    let container = VirtualUri::parse("eml:/mail/inbox.eml").unwrap();

    assert_eq!(fs.read_directory(&container).await.unwrap().len(), 2);

    // Different size, so the change is seen even with coarse mtimes.
    std::fs::copy(fixture("multi.eml"), &path).unwrap();
    let names: Vec<String> = fs
        .read_directory(&container)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["inboxhtml", "b.txt", "a.txt", "c.bin"]);
    assert_eq!(fs.cache().stats().invalidations(), 1);

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("change event")
        .expect("channel open");
    assert_eq!(event.uri.to_string(), "eml:/mail/inbox.eml");
    assert_eq!(event.kind, FileChangeType::Changed);
}

#[tokio::test]
async fn test_deleted_container_is_evicted() {
    let tmp = tempfile::tempdir().unwrap();
    let root = mail_root(&tmp);
    let path = root.join("inbox.eml");
    std::fs::copy(fixture("inbox.eml"), &path).unwrap();
    let cache = EmailCache::default();
    let mut events = cache.subscribe();

    cache.get(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(cache.get(&path).await.is_err());
    assert!(cache.is_empty());

    let invalidation = events.try_recv().expect("invalidation");
    assert_eq!(invalidation.path, path);
}

#[tokio::test]
async fn test_without_revalidation_entries_stay() {
    let tmp = tempfile::tempdir().unwrap();
    let path = mail_root(&tmp).join("inbox.eml");
    std::fs::copy(fixture("inbox.eml"), &path).unwrap();
    let cache = EmailCache::new(4, u64::MAX, false);

    cache.get(&path).await.unwrap();
    std::fs::copy(fixture("multi.eml"), &path).unwrap();
    let Lookup::Parsed(email) = cache.get(&path).await.unwrap() else {
        panic!("expected parsed email");
    };
    assert_eq!(email.subject, "Hi");
    assert_eq!(cache.stats().parses(), 1);
}

#[tokio::test]
async fn test_capacity_evicts_least_recently_used() {
    let tmp = tempfile::tempdir().unwrap();
    let root = mail_root(&tmp);
    let a = root.join("a.eml");
    let b = root.join("b.eml");
    std::fs::copy(fixture("inbox.eml"), &a).unwrap();
    std::fs::copy(fixture("plain.eml"), &b).unwrap();
    let cache = EmailCache::new(1, u64::MAX, true);

    cache.get(&a).await.unwrap();
    cache.get(&b).await.unwrap();
    assert_eq!(cache.len(), 1);
    cache.get(&a).await.unwrap();
    assert_eq!(cache.stats().parses(), 3);
}
