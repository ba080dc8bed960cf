use super::*;
use crate::pipeline::FileRegistry;
use cryoflow_adapters::{FakeClusterDriver, FakeNotifier, FakeWatcher};
use cryoflow_core::{
    FakeClock, InputMode, JobStatus, Project, ProjectId, SequentialIdGen, Session, SessionConfig,
    SessionStatus, UserId,
};
use cryoflow_storage::{InMemoryStore, SessionStore};
use std::sync::Arc;
use std::time::Duration;

async fn new_session(store: &InMemoryStore, input_mode: InputMode) -> cryoflow_core::SessionId {
    let project_id = ProjectId::new("proj-1");
    store.insert_project(Project::new(project_id.clone(), "proj")).await.unwrap();
    let session = Session::new(
        cryoflow_core::SessionId::new("sess-1"),
        project_id,
        UserId::new("user-1"),
        "session one",
        input_mode,
        std::path::PathBuf::from("/watch"),
        "*.tiff".to_string(),
        SessionConfig::default(),
        0,
    );
    let id = session.id.clone();
    store.insert_session(session).await.unwrap();
    store.set_session_status(&id, SessionStatus::Running).await.unwrap();
    id
}

#[tokio::test]
async fn watcher_files_added_event_drives_a_pipeline_pass() {
    let store = Arc::new(InMemoryStore::new());
    let session_id = new_session(&store, InputMode::Watch).await;
    let driver = Arc::new(FakeClusterDriver::new());
    let watcher = Arc::new(FakeWatcher::new());

    let handle = tokio::spawn({
        let store = store.clone();
        let driver = driver.clone();
        let watcher = watcher.clone();
        async move {
            run(
                &Registry::new(),
                &*store,
                &*driver,
                &*watcher,
                &FakeNotifier::new(),
                &FakeClock::at(1_000),
                &SequentialIdGen::new("job"),
                &FileRegistry::new(),
                &tempfile::tempdir().unwrap().path().to_path_buf(),
                &NullJournal,
            )
            .await;
        }
    });

    // Resend until the event loop has subscribed: a broadcast send before
    // the first subscriber is attached is silently dropped.
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            watcher.push_files_added(session_id.clone(), vec![std::path::PathBuf::from("movie1.tiff")]);
            if !driver.calls().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("import stage was never submitted");

    let session = store.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.state.movies_found, 1);
    assert!(session.jobs.import_id.is_some());

    handle.abort();
}

#[tokio::test]
async fn no_files_in_existing_mode_completes_the_session() {
    let store = Arc::new(InMemoryStore::new());
    let session_id = new_session(&store, InputMode::Existing).await;
    let driver = Arc::new(FakeClusterDriver::new());
    let watcher = Arc::new(FakeWatcher::new());

    let handle = tokio::spawn({
        let store = store.clone();
        let driver = driver.clone();
        let watcher = watcher.clone();
        async move {
            run(
                &Registry::new(),
                &*store,
                &*driver,
                &*watcher,
                &FakeNotifier::new(),
                &FakeClock::at(1_000),
                &SequentialIdGen::new("job"),
                &FileRegistry::new(),
                &tempfile::tempdir().unwrap().path().to_path_buf(),
                &NullJournal,
            )
            .await;
        }
    });

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            watcher.push_no_files(session_id.clone());
            let session = store.get_session(&session_id).await.unwrap().unwrap();
            if session.status == SessionStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session was never completed");

    handle.abort();
}

#[tokio::test]
async fn cluster_status_change_advances_the_session() {
    let store = Arc::new(InMemoryStore::new());
    let session_id = new_session(&store, InputMode::Watch).await;
    let driver = Arc::new(FakeClusterDriver::new());
    let watcher = Arc::new(FakeWatcher::new());

    let handle = tokio::spawn({
        let store = store.clone();
        let driver = driver.clone();
        let watcher = watcher.clone();
        async move {
            run(
                &Registry::new(),
                &*store,
                &*driver,
                &*watcher,
                &FakeNotifier::new(),
                &FakeClock::at(1_000),
                &SequentialIdGen::new("job"),
                &FileRegistry::new(),
                &tempfile::tempdir().unwrap().path().to_path_buf(),
                &NullJournal,
            )
            .await;
        }
    });

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            watcher.push_files_added(session_id.clone(), vec![std::path::PathBuf::from("movie1.tiff")]);
            if !driver.calls().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("import stage was never submitted");

    let import_job_id = store.get_session(&session_id).await.unwrap().unwrap().jobs.import_id.unwrap();
    driver.emit(import_job_id, "fake-1".to_string(), JobStatus::Success);

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let session = store.get_session(&session_id).await.unwrap().unwrap();
            if session.state.movies_imported == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("motion stage was never advanced to");

    handle.abort();
}

#[test]
fn null_journal_never_errors() {
    let event = cryoflow_core::Event::Shutdown;
    assert!(NullJournal.record(&event).is_ok());
}
