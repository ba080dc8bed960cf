use super::*;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn accepts_matches_extension_case_insensitively_and_ignores_dotfiles() {
    assert!(accepts(Path::new("/a/movie.TIFF"), "tif,tiff"));
    assert!(accepts(Path::new("/a/movie.tif"), "tif,tiff"));
    assert!(!accepts(Path::new("/a/.movie.tiff"), "tif,tiff"));
    assert!(!accepts(Path::new("/a/movie.mrc"), "tif,tiff"));
}

#[test]
fn scan_one_level_finds_root_and_one_level_of_subdirectory_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.tiff"), b"1").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("b.tiff"), b"2").unwrap();
    let subsub = sub.join("deeper");
    fs::create_dir(&subsub).unwrap();
    fs::write(subsub.join("c.tiff"), b"3").unwrap();

    let mut found = scan_one_level(dir.path(), "tiff").unwrap();
    found.sort();
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|p| p.ends_with("a.tiff")));
    assert!(found.iter().any(|p| p.ends_with("b.tiff")));
}

#[tokio::test]
async fn wait_stable_returns_true_once_size_stops_changing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movie.tiff");
    fs::write(&path, b"hello").unwrap();
    let stable = wait_stable(&path, Duration::from_millis(20), Duration::from_millis(60)).await;
    assert!(stable);
}

#[tokio::test]
async fn wait_stable_returns_false_if_file_disappears() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.tiff");
    fs::write(&path, b"hello").unwrap();
    let watcher_path = path.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let _ = std::fs::remove_file(&watcher_path);
    });
    let stable = wait_stable(&path, Duration::from_millis(5), Duration::from_millis(200)).await;
    assert!(!stable);
}

#[tokio::test]
async fn existing_mode_emits_no_files_for_empty_directory() {
    let dir = tempdir().unwrap();
    let watcher = FsWatcher::new();
    let mut rx = watcher.subscribe();
    let session_id = SessionId::new("sess-1");

    watcher
        .start(
            session_id.clone(),
            dir.path().to_path_buf(),
            "tiff".to_string(),
            InputMode::Existing,
        )
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, WatcherEvent::NoFiles { session_id: s } if s == session_id));
}

#[tokio::test]
async fn existing_mode_emits_files_added_once_stable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.tiff"), b"stable").unwrap();
    let watcher = FsWatcher::new();
    let mut rx = watcher.subscribe();
    let session_id = SessionId::new("sess-2");

    watcher
        .start(
            session_id.clone(),
            dir.path().to_path_buf(),
            "tiff".to_string(),
            InputMode::Existing,
        )
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match event {
        WatcherEvent::FilesAdded { session_id: s, count, .. } => {
            assert_eq!(s, session_id);
            assert_eq!(count, 1);
        }
        other => panic!("expected FilesAdded, got {other:?}"),
    }
    assert_eq!(watcher.file_count(&session_id), 1);
}

#[tokio::test]
async fn start_twice_for_same_session_is_rejected() {
    let dir = tempdir().unwrap();
    let watcher = FsWatcher::new();
    let session_id = SessionId::new("sess-3");
    watcher
        .start(
            session_id.clone(),
            dir.path().to_path_buf(),
            "tiff".to_string(),
            InputMode::Watch,
        )
        .await
        .unwrap();

    let err = watcher
        .start(
            session_id.clone(),
            dir.path().to_path_buf(),
            "tiff".to_string(),
            InputMode::Watch,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WatcherError::AlreadyWatching(s) if s == session_id));
    watcher.stop(&session_id).await;
}

#[tokio::test]
async fn start_on_missing_directory_fails() {
    let watcher = FsWatcher::new();
    let session_id = SessionId::new("sess-4");
    let err = watcher
        .start(
            session_id,
            PathBuf::from("/nonexistent/path/does/not/exist"),
            "tiff".to_string(),
            InputMode::Watch,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WatcherError::DirectoryUnavailable { .. }));
}
