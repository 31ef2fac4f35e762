//! Whole-repository downloads against a scripted hub.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use common::*;
use hubcache::{Error, FetchPhase, PausedRepositories, RepositoryId, RepositoryProgress, RetryPolicy};
use tempfile::tempdir;

const CONTENT: &[u8] = b"0123456789";

fn acme() -> RepositoryId {
    "acme/model".parse().unwrap()
}

#[tokio::test]
async fn identical_files_share_one_blob() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10), ("b.bin", 10)]);
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    hf_file(&client, "acme/model", "main", "b.bin", "H1", CONTENT);
    let downloader = downloader(dir.path(), client, fast_options());

    let link = downloader.download_repository(&acme(), "main").await.unwrap();

    assert_eq!(link, dir.path().join("model"));
    assert!(downloader.is_downloaded(&acme()));
    assert_eq!(blobs(dir.path(), "models--acme--model"), vec!["H1".to_string()]);
    assert_eq!(downloader.client().gets_to(&cdn_url("H1")).len(), 1);

    let snapshot = dir.path().join("models--acme--model/snapshots/main");
    for name in ["a.bin", "b.bin"] {
        let pointer = snapshot.join(name);
        assert!(pointer.is_symlink());
        assert_eq!(
            std::fs::canonicalize(&pointer).unwrap(),
            std::fs::canonicalize(dir.path().join("models--acme--model/blobs/H1")).unwrap()
        );
        assert_eq!(std::fs::read(link.join(name)).unwrap(), CONTENT);
    }
}

#[tokio::test]
async fn published_repository_needs_no_requests() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10)]);
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    let downloader = downloader(dir.path(), client, fast_options());

    let first = downloader.download_repository(&acme(), "main").await.unwrap();
    downloader.client().clear_requests();
    let second = downloader.download_repository(&acme(), "main").await.unwrap();

    assert_eq!(first, second);
    assert!(downloader.client().requests().is_empty());
}

#[tokio::test]
async fn published_link_answers_for_any_revision() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10)]);
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    let downloader = downloader(dir.path(), client, fast_options());

    let main = downloader.download_repository(&acme(), "main").await.unwrap();
    downloader.client().clear_requests();
    let v2 = downloader.download_repository(&acme(), "v2").await.unwrap();

    assert_eq!(main, v2);
    assert!(downloader.client().requests().is_empty());
    assert!(!dir.path().join("models--acme--model/snapshots/v2").exists());
}

#[tokio::test]
async fn empty_files_do_not_block_publishing() {
    let dir = tempdir().unwrap();
    let empty = sha256(b"");
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("__init__.py", 0), ("a.bin", 10)]);
    hf_file(&client, "acme/model", "main", "__init__.py", &empty, b"");
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    let downloader = downloader(dir.path(), client, fast_options());

    let link = downloader.download_repository(&acme(), "main").await.unwrap();

    assert_eq!(std::fs::read(link.join("__init__.py")).unwrap(), b"");
    assert_eq!(std::fs::read(link.join("a.bin")).unwrap(), CONTENT);
    let mut expected = vec![empty, "H1".to_string()];
    expected.sort();
    assert_eq!(blobs(dir.path(), "models--acme--model"), expected);
}

#[tokio::test]
async fn failed_file_aborts_the_rest() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    hf_listing(
        &client,
        "acme/model",
        "main",
        &[("a.bin", 10), ("b.bin", 10), ("c.bin", 10)],
    );
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    // b.bin is not scripted: every probe answers 404.
    hf_file(&client, "acme/model", "main", "c.bin", "H3", b"cccccccccc");
    let downloader = downloader(dir.path(), client, fast_options());

    let err = downloader
        .download_repository(&acme(), "main")
        .await
        .unwrap_err();

    match &err {
        Error::PartialFailure { path, .. } => assert_eq!(path, "b.bin"),
        other => panic!("expected PartialFailure, got {other:?}"),
    }
    assert_eq!(err.attempts(), Some(3));
    assert!(matches!(err.root_cause(), Error::NotFound { status: 404, .. }));

    let snapshot = dir.path().join("models--acme--model/snapshots/main");
    assert!(snapshot.join("a.bin").is_symlink());
    assert!(!snapshot.join("b.bin").exists());
    assert!(!snapshot.join("c.bin").exists());
    assert!(!downloader.is_downloaded(&acme()));

    let requests = downloader.client().requests();
    let b_probes = requests
        .iter()
        .filter(|r| r.url == resolve_url("acme/model", "main", "b.bin"))
        .count();
    assert_eq!(b_probes, 3);
    assert!(!requests.iter().any(|r| r.url.contains("c.bin") || r.url.contains("H3")));
}

#[tokio::test]
async fn missing_repository_is_a_listing_error() {
    let dir = tempdir().unwrap();
    let options = fast_options().retry(RetryPolicy::default().max_attempts(1));
    let downloader = downloader(dir.path(), MockClient::new(), options);

    let err = downloader
        .download_repository(&acme(), "main")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Listing { .. }));
    assert!(matches!(err.root_cause(), Error::NotFound { status: 404, .. }));
}

#[tokio::test]
async fn garbage_listing_is_invalid_response() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    client.on_get(&listing_url("acme/model", "main"), 200, "<html>oops</html>");
    let options = fast_options().retry(RetryPolicy::default().max_attempts(1));
    let downloader = downloader(dir.path(), client, options);

    let err = downloader.list_files(&acme(), "main").await.unwrap_err();
    assert!(matches!(err.root_cause(), Error::InvalidResponse(_)));
}

#[tokio::test]
async fn paused_repository_sends_nothing() {
    let dir = tempdir().unwrap();
    let paused = PausedRepositories::new();
    paused.pause("acme/model");
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10)]);
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    let downloader = downloader(dir.path(), client, fast_options().paused(paused));

    let err = downloader
        .download_repository(&acme(), "main")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Paused(_)));
    assert!(downloader.client().requests().is_empty());
}

#[tokio::test]
async fn pause_mid_transfer_then_resume() {
    let dir = tempdir().unwrap();
    let paused = PausedRepositories::new();
    let trigger = paused.clone();
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10)]);
    hf_file(&client, "acme/model", "main", "a.bin", "H1", CONTENT);
    let fired = AtomicBool::new(false);
    let options = fast_options()
        .paused(paused.clone())
        .on_progress(move |p| {
            let past_first_chunk = p.phase == FetchPhase::Downloading && p.bytes_downloaded >= 4;
            if past_first_chunk && !fired.swap(true, Ordering::SeqCst) {
                trigger.pause("acme/model");
            }
        });
    let downloader = downloader(dir.path(), client, options);

    let err = downloader
        .download_repository(&acme(), "main")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Paused(_)));
    assert_eq!(downloader.client().gets_to(&cdn_url("H1")).len(), 1);
    let staging = dir.path().join("models--acme--model/blobs/H1.incomplete");
    assert_eq!(std::fs::read(&staging).unwrap(), &CONTENT[..4]);

    paused.resume("acme/model");
    downloader.download_repository(&acme(), "main").await.unwrap();

    let gets = downloader.client().gets_to(&cdn_url("H1"));
    assert_eq!(gets.len(), 2);
    assert_eq!(gets[1].header("range"), Some("bytes=4-"));
    assert!(downloader.is_downloaded(&acme()));
}

#[tokio::test]
async fn concurrent_files_publish_once_all_finish() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    let files = [("a.bin", "HA"), ("sub/b.bin", "HB"), ("sub/deeper/c.bin", "HC")];
    hf_listing(
        &client,
        "acme/model",
        "main",
        &files.map(|(path, _)| (path, 10)),
    );
    for (path, hash) in files {
        hf_file(&client, "acme/model", "main", path, hash, CONTENT);
    }
    let reports: Arc<Mutex<Vec<RepositoryProgress>>> = Arc::default();
    let sink = reports.clone();
    let options = fast_options()
        .concurrency(3)
        .on_repository_progress(move |p| sink.lock().unwrap().push(*p));
    let downloader = downloader(dir.path(), client, options);

    let link = downloader.download_repository(&acme(), "main").await.unwrap();

    for (path, _) in files {
        assert_eq!(std::fs::read(link.join(path)).unwrap(), CONTENT);
    }
    let reports = reports.lock().unwrap();
    let last = reports.last().unwrap();
    assert!(last.is_complete());
    assert_eq!(last.files_total, 3);
    assert_eq!(last.bytes_done, 30);
    assert_eq!(reports.first().unwrap().files_done, 0);
}

#[tokio::test]
async fn size_listing_and_removal() {
    let dir = tempdir().unwrap();
    let client = MockClient::new();
    hf_listing(&client, "acme/model", "main", &[("a.bin", 10), ("b.bin", 32)]);
    hf_file(&client, "acme/model", "main", "a.bin", "HA", CONTENT);
    hf_file(&client, "acme/model", "main", "b.bin", "HB", &[7u8; 32]);
    let downloader = downloader(dir.path(), client, fast_options());

    assert_eq!(downloader.repository_size(&acme(), "main").await.unwrap(), 42);
    assert!(downloader.layout().local_repositories().unwrap().is_empty());

    downloader.download_repository(&acme(), "main").await.unwrap();
    assert_eq!(
        downloader.layout().local_repositories().unwrap(),
        vec!["model".to_string()]
    );
    assert_eq!(downloader.repository_path(&acme()), dir.path().join("model"));

    assert!(downloader.delete_repository(&acme()).unwrap());
    assert!(!downloader.is_downloaded(&acme()));
    assert!(!dir.path().join("models--acme--model").exists());
    assert!(!downloader.delete_repository(&acme()).unwrap());
}
