use super::*;

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        state_dir: dir.to_path_buf(),
        socket_path: dir.join("daemon.sock"),
        lock_path: dir.join("daemon.pid"),
        log_path: dir.join("daemon.log"),
        store_dir: dir.join("store"),
        projects_root: dir.join("projects"),
    }
}

#[tokio::test]
async fn startup_creates_socket_and_returns_no_resumed_sessions_on_a_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let result = startup(&config).await.expect("startup");
    assert!(config.socket_path.exists());
    assert!(result.resumed.is_empty());
    shutdown(&config);
}

#[tokio::test]
async fn a_second_startup_against_the_same_lock_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let first = startup(&config).await.expect("first startup");

    let second = startup(&config).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_, _))));

    drop(first.lock);
    shutdown(&config);
}
