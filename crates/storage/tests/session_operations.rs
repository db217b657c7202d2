//! Integration tests for session store/get/get_all over the in-memory backend.
//!
//! Covers:
//! - store: tag count and order, single vs batch, empty batch, failures
//! - get: round trip, empty keys, missing objects
//! - get_all: extension filter, listing order, empty prefixes, failures
//! - session wiring: bucket validation, shared clients, cleanup

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use s3_stash_storage::{
    create_session, progress_fn, MemoryStorageClient, ObjectContent, Payload, Session,
    SessionConfig, SessionError, StorageClient, StorageError, TransferProgress,
};

const BUCKET: &str = "stash-test";

/// Session on a fresh in-memory client with one bucket.
fn create_test_session(directory: Option<&str>) -> Session<MemoryStorageClient> {
    let mut config = SessionConfig::new(BUCKET);
    if let Some(dir) = directory {
        config = config.with_directory(dir);
    }
    create_session(config, MemoryStorageClient::new().with_bucket(BUCKET)).unwrap()
}

fn image(name: &str) -> Payload {
    Payload::from_bytes(name, format!("pixels of {}", name).into_bytes())
        .with_content_type("image/png")
}

// ============================================================================
// store
// ============================================================================

#[tokio::test]
async fn test_store_single_file_and_get_it_back() {
    let session = create_test_session(Some("test run"));

    let tags: Vec<String> = session.store(image("singleFile.png")).await.unwrap();
    assert_eq!(tags.len(), 1);

    let found: ObjectContent = session.get("singleFile.png").await.unwrap();
    assert_eq!(found.etag, tags[0]);
    assert_eq!(found.key, "test-run/singleFile.png");
    assert_eq!(found.text().unwrap(), "pixels of singleFile.png");
}

#[tokio::test]
async fn test_store_multiple_files_and_get_them_back() {
    let session = create_test_session(Some("test run"));
    let files: Vec<Payload> = vec![image("multiFile1.png"), image("multiFile2.png")];

    let tags: Vec<String> = session.store(files.clone()).await.unwrap();
    assert_eq!(tags.len(), 2);

    let first: ObjectContent = session.get(&files[0].name).await.unwrap();
    let second: ObjectContent = session.get(&files[1].name).await.unwrap();
    assert_eq!(vec![first.etag, second.etag], tags);
}

#[tokio::test]
async fn test_store_tags_follow_input_order() {
    let session = create_test_session(None);
    let payloads: Vec<Payload> = (0..8)
        .map(|i| Payload::from_bytes(format!("img-{}.png", i), vec![i as u8; 16]))
        .collect();

    let tags: Vec<String> = session.store(payloads.clone()).await.unwrap();
    assert_eq!(tags.len(), payloads.len());

    for (payload, tag) in payloads.iter().zip(tags.iter()) {
        let content: ObjectContent = session.get(&payload.name).await.unwrap();
        assert_eq!(&content.etag, tag);
    }
}

#[tokio::test(start_paused = true)]
async fn test_store_order_independent_of_completion_order() {
    let session = create_test_session(None);
    let client: &MemoryStorageClient = session.client();
    client.delay_key("slow.png", Duration::from_millis(200));
    client.delay_key("medium.png", Duration::from_millis(100));

    let start = tokio::time::Instant::now();
    let tags: Vec<String> = session
        .store([image("slow.png"), image("medium.png"), image("fast.png")])
        .await
        .unwrap();
    let elapsed: Duration = start.elapsed();

    // Writes overlap: the batch takes as long as its slowest member.
    assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);

    for (name, tag) in ["slow.png", "medium.png", "fast.png"].iter().zip(tags.iter()) {
        assert_eq!(&session.get(name).await.unwrap().etag, tag);
    }
}

#[tokio::test]
async fn test_store_empty_batch_is_rejected() {
    let session = create_test_session(None);
    let result = session.store(Vec::<Payload>::new()).await;

    assert!(matches!(result, Err(SessionError::InvalidArgument { .. })));
    assert_eq!(session.client().put_count(), 0);
}

#[tokio::test]
async fn test_store_rejects_empty_name_without_writing() {
    let session = create_test_session(None);
    let result = session.store([image("ok.png"), image("")]).await;

    assert!(matches!(result, Err(SessionError::InvalidArgument { .. })));
    assert_eq!(session.client().put_count(), 0);
}

#[tokio::test]
async fn test_store_fails_whole_batch_when_one_write_fails() {
    let session = create_test_session(None);
    session.client().fail_writes_to("f2.png");

    let result = session.store([image("f1.png"), image("f2.png")]).await;

    match result {
        Err(SessionError::StorageWrite { key, source }) => {
            assert_eq!(key, "f2.png");
            assert!(matches!(source, StorageError::NetworkError { .. }));
        }
        other => panic!("expected StorageWrite, got {:?}", other),
    }
    // No rollback: the sibling write still landed.
    assert_eq!(session.client().keys(BUCKET), vec!["f1.png"]);
}

#[tokio::test]
async fn test_store_reports_first_failure_in_input_order() {
    let session = create_test_session(None);
    session.client().fail_writes_to("b.png");
    session.client().fail_writes_to("c.png");
    session.client().delay_key("b.png", Duration::from_millis(20));

    let err: SessionError = session
        .store([image("a.png"), image("b.png"), image("c.png")])
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::StorageWrite { ref key, .. } if key == "b.png"));
}

#[tokio::test]
async fn test_store_against_missing_bucket_rejects() {
    let session: Session<MemoryStorageClient> = create_session(
        SessionConfig::new("non-existent-bucket"),
        MemoryStorageClient::new(),
    )
    .unwrap();

    let err: SessionError = session.store(image("failFile.png")).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::StorageWrite {
            source: StorageError::BucketNotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_store_same_name_twice_overwrites() {
    let session = create_test_session(None);

    let first: Vec<String> = session
        .store(Payload::from_bytes("same.png", b"first".to_vec()))
        .await
        .unwrap();
    let second: Vec<String> = session
        .store(Payload::from_bytes("same.png", b"second".to_vec()))
        .await
        .unwrap();
    assert_ne!(first, second);

    let content: ObjectContent = session.get("same.png").await.unwrap();
    assert_eq!(content.etag, second[0]);
    assert_eq!(content.data, b"second");
    assert_eq!(session.client().put_count(), 2);
}

#[tokio::test]
async fn test_store_from_file() {
    let dir: tempfile::TempDir = tempfile::tempdir().unwrap();
    let path: std::path::PathBuf = dir.path().join("Future.png");
    std::fs::write(&path, b"\x89PNG fake image").unwrap();

    let session = create_test_session(Some("files"));
    let tags: Vec<String> = session
        .store(Payload::from_file("Future.png", path.to_str().unwrap()))
        .await
        .unwrap();

    let content: ObjectContent = session.get("Future.png").await.unwrap();
    assert_eq!(content.etag, tags[0]);
    assert_eq!(content.data, b"\x89PNG fake image");
}

#[tokio::test]
async fn test_store_progress_and_cancellation() {
    let session = create_test_session(None);

    let seen: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
    let seen_clone: Arc<AtomicU64> = Arc::clone(&seen);
    let until_second = progress_fn(move |p: &TransferProgress| {
        seen_clone.fetch_add(1, Ordering::SeqCst);
        assert_eq!(p.overall_total, 3);
        p.overall_started < 2
    });

    let err: SessionError = session
        .store_with_progress(
            [image("a.png"), image("b.png"), image("c.png")],
            Some(&until_second),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::StorageWrite {
            source: StorageError::Cancelled,
            ..
        }
    ));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert!(session.client().put_count() <= 1);
}

#[tokio::test]
async fn test_store_progress_sees_every_payload() {
    let session = create_test_session(None);
    let seen: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
    let seen_clone: Arc<AtomicU64> = Arc::clone(&seen);
    let counter = progress_fn(move |_: &TransferProgress| {
        seen_clone.fetch_add(1, Ordering::SeqCst);
        true
    });

    let tags: Vec<String> = session
        .store_with_progress([image("a.png"), image("b.png")], Some(&counter))
        .await
        .unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

// ============================================================================
// get
// ============================================================================

#[tokio::test]
async fn test_get_empty_key_rejected_without_backend_call() {
    let session = create_test_session(None);

    for key in ["", "/", "   "] {
        let err: SessionError = session.get(key).await.unwrap_err();
        assert!(err.is_invalid_argument(), "key {:?}", key);
    }
    assert_eq!(session.client().get_count(), 0);
}

#[tokio::test]
async fn test_get_missing_object_is_read_error() {
    let session = create_test_session(Some("photos"));
    let err: SessionError = session.get("missing.png").await.unwrap_err();

    match err {
        SessionError::StorageRead { key, source } => {
            assert_eq!(key, "photos/missing.png");
            assert!(source.is_not_found());
        }
        other => panic!("expected StorageRead, got {:?}", other),
    }
}

// ============================================================================
// get_all
// ============================================================================

#[tokio::test]
async fn test_get_all_filters_by_extension_in_listing_order() {
    let session = create_test_session(Some("gallery"));
    session
        .store([
            Payload::from_bytes("a.png", b"a".to_vec()),
            Payload::from_bytes("b.txt", b"b".to_vec()),
            Payload::from_bytes("c.PNG", b"c".to_vec()),
        ])
        .await
        .unwrap();

    let keys: Vec<String> = session.list(None).await.unwrap();
    assert_eq!(keys, vec!["a.png", "c.PNG"]);

    let contents: Vec<ObjectContent> = session.get_all(None).await.unwrap();
    let found: Vec<&str> = contents.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(found, vec!["gallery/a.png", "gallery/c.PNG"]);
}

#[tokio::test]
async fn test_get_all_returns_stored_tags() {
    let session = create_test_session(Some("test run"));
    let mut stored: Vec<String> = session.store(image("singleFile.png")).await.unwrap();
    stored.extend(
        session
            .store([image("multiFile1.png"), image("multiFile2.png")])
            .await
            .unwrap(),
    );

    let tags: Vec<String> = session
        .get_all(None)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.etag)
        .collect();

    // Listing order is lexicographic: multiFile1, multiFile2, singleFile.
    assert_eq!(tags, vec![stored[1].clone(), stored[2].clone(), stored[0].clone()]);
}

#[tokio::test]
async fn test_get_all_empty_prefix_is_empty() {
    let session = create_test_session(Some("gallery"));
    session
        .store(Payload::from_bytes("notes.txt", b"text".to_vec()))
        .await
        .unwrap();

    assert!(session.get_all(None).await.unwrap().is_empty());
    assert!(session.get_all(Some("nothing-here")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_all_named_prefix_and_subdirectories() {
    let session = create_test_session(None);
    session
        .store([
            image("top.jpg"),
            image("thumbs/a.gif"),
            image("thumbs/deep/b.jpeg"),
            image("thumbs/readme.md"),
        ])
        .await
        .unwrap();

    let root: Vec<String> = session.list(None).await.unwrap();
    assert_eq!(root, vec!["top.jpg"]);

    let thumbs: Vec<ObjectContent> = session.get_all(Some("thumbs")).await.unwrap();
    let keys: Vec<&str> = thumbs.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["thumbs/a.gif"]);

    let everything: Vec<ObjectContent> =
        session.get_all_recursive(Some("/thumbs/")).await.unwrap();
    let keys: Vec<&str> = everything.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["thumbs/a.gif", "thumbs/deep/b.jpeg"]);
}

#[tokio::test]
async fn test_get_all_aborts_when_one_fetch_fails() {
    let session = create_test_session(None);
    session.store([image("a.png"), image("b.png")]).await.unwrap();
    session.client().fail_reads_from("b.png");

    let err: SessionError = session.get_all(None).await.unwrap_err();
    assert!(matches!(err, SessionError::StorageRead { ref key, .. } if key == "b.png"));
}

#[tokio::test(start_paused = true)]
async fn test_get_all_order_independent_of_completion_order() {
    let session = create_test_session(Some("gallery"));
    session
        .store([image("a.png"), image("b.png"), image("c.png")])
        .await
        .unwrap();
    let client: &MemoryStorageClient = session.client();
    client.delay_key("gallery/a.png", Duration::from_millis(300));
    client.delay_key("gallery/b.png", Duration::from_millis(200));

    let start = tokio::time::Instant::now();
    let contents: Vec<ObjectContent> = session.get_all(None).await.unwrap();
    let elapsed: Duration = start.elapsed();

    // Reads overlap: the listing takes as long as its slowest fetch.
    assert!(elapsed < Duration::from_millis(500), "elapsed {:?}", elapsed);

    let keys: Vec<&str> = contents.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["gallery/a.png", "gallery/b.png", "gallery/c.png"]);
    assert_eq!(contents[0].text().unwrap(), "pixels of a.png");
}

#[tokio::test]
async fn test_get_all_recursive_fetches_key_with_empty_segment_as_listed() {
    let session = create_test_session(None);
    let client: &MemoryStorageClient = session.client();
    client
        .put_object(BUCKET, "gallery//a.png", b"double slash", None)
        .await
        .unwrap();
    client
        .put_object(BUCKET, "gallery/a.png", b"single slash", None)
        .await
        .unwrap();

    let contents: Vec<ObjectContent> = session.get_all_recursive(None).await.unwrap();
    let found: Vec<(&str, &str)> = contents
        .iter()
        .map(|c| (c.key.as_str(), c.text().unwrap()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("gallery//a.png", "double slash"),
            ("gallery/a.png", "single slash"),
        ]
    );
}

#[tokio::test]
async fn test_get_all_recursive_fetches_key_with_parent_segment_as_listed() {
    let session = create_test_session(None);
    let client: &MemoryStorageClient = session.client();
    client
        .put_object(BUCKET, "gallery/x/../y.png", b"dotted", None)
        .await
        .unwrap();

    let contents: Vec<ObjectContent> = session.get_all_recursive(None).await.unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].key, "gallery/x/../y.png");
    assert_eq!(contents[0].text().unwrap(), "dotted");
}

#[tokio::test]
async fn test_get_all_listing_failure() {
    let session = create_test_session(None);
    session.client().fail_listings();

    let err: SessionError = session.get_all(Some("thumbs")).await.unwrap_err();
    assert!(matches!(err, SessionError::Listing { ref prefix, .. } if prefix == "thumbs/"));
}

// ============================================================================
// session wiring
// ============================================================================

#[test]
fn test_session_requires_bucket() {
    let result = create_session(SessionConfig::new(""), MemoryStorageClient::new());
    assert!(matches!(result, Err(SessionError::InvalidArgument { .. })));
}

#[tokio::test]
async fn test_sessions_sharing_a_client_stay_in_their_namespace() {
    let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new().with_bucket(BUCKET));
    let left = Session::with_shared_client(
        SessionConfig::new(BUCKET).with_directory("left"),
        Arc::clone(&client),
    )
    .unwrap();
    let right = Session::with_shared_client(
        SessionConfig::new(BUCKET).with_directory("right"),
        Arc::clone(&client),
    )
    .unwrap();

    left.store(image("a.png")).await.unwrap();
    right.store(image("b.png")).await.unwrap();

    assert_eq!(left.list(None).await.unwrap(), vec!["a.png"]);
    assert_eq!(right.list(None).await.unwrap(), vec!["b.png"]);
    assert!(left.get("b.png").await.is_err());

    let deleted: u64 = left.clear().await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(client.keys(BUCKET), vec!["right/b.png"]);
}

#[tokio::test]
async fn test_clear_failure_is_delete_error() {
    let session = create_session(SessionConfig::new(BUCKET), MemoryStorageClient::new()).unwrap();

    let err: SessionError = session.clear().await.unwrap_err();
    match err {
        SessionError::Delete { prefix, source } => {
            assert_eq!(prefix, "");
            assert!(matches!(source, StorageError::BucketNotFound { .. }));
        }
        other => panic!("expected Delete, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cloned_session_shares_client() {
    let session = create_test_session(None);
    let clone = session.clone();

    session.store(image("a.png")).await.unwrap();
    assert!(clone.get("a.png").await.is_ok());
    assert!(Arc::ptr_eq(session.client(), clone.client()));
}
