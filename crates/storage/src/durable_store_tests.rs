use super::*;
use crate::store::SessionStore;
use cryoflow_core::{InputMode, JobId, ProjectId, Session, SessionConfig, SessionId, UserId};
use std::path::PathBuf;
use tempfile::tempdir;

fn session(id: &str) -> Session {
    Session::new(
        SessionId::new(id),
        ProjectId::new("proj-1"),
        UserId::new("alice"),
        "test",
        InputMode::Watch,
        PathBuf::from("/data"),
        "*.tiff",
        SessionConfig::default(),
        0,
    )
}

#[tokio::test]
async fn insert_session_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    {
        let store = DurableSessionStore::open(dir.path()).expect("open");
        store.insert_session(session("sess-1")).await.expect("insert");
    }

    let reopened = DurableSessionStore::open(dir.path()).expect("reopen");
    let found = reopened
        .get_session(&SessionId::new("sess-1"))
        .await
        .expect("get")
        .expect("some");
    assert_eq!(found.id, SessionId::new("sess-1"));
}

#[tokio::test]
async fn record_event_is_replayed_after_reopen_without_explicit_snapshot() {
    let dir = tempdir().expect("tempdir");
    {
        let store = DurableSessionStore::open(dir.path()).expect("open");
        store.insert_session(session("sess-1")).await.expect("insert");
        store
            .record_event(&Event::FilesAdded {
                session_id: SessionId::new("sess-1"),
                files: vec![],
                count: 5,
            })
            .expect("record");
    }

    let reopened = DurableSessionStore::open(dir.path()).expect("reopen");
    let found = reopened
        .get_session(&SessionId::new("sess-1"))
        .await
        .expect("get")
        .expect("some");
    assert_eq!(found.state.movies_found, 5);
}

#[tokio::test]
async fn mutations_after_last_snapshot_are_not_lost_mid_session() {
    let dir = tempdir().expect("tempdir");
    let store = DurableSessionStore::open(dir.path()).expect("open");
    store.insert_session(session("sess-1")).await.expect("insert");
    store
        .raise_movies_found(&SessionId::new("sess-1"), 9)
        .await
        .expect("raise");

    let reopened = DurableSessionStore::open(dir.path()).expect("reopen");
    let found = reopened
        .get_session(&SessionId::new("sess-1"))
        .await
        .expect("get")
        .expect("some");
    assert_eq!(found.state.movies_found, 9);
}

#[tokio::test]
async fn job_status_changed_event_updates_status_across_restart() {
    let dir = tempdir().expect("tempdir");
    {
        let store = DurableSessionStore::open(dir.path()).expect("open");
        store
            .insert_job(crate::store::NewJob {
                id: JobId::new("job-1"),
                project_id: ProjectId::new("proj-1"),
                user_id: UserId::new("alice"),
                session_id: SessionId::new("sess-1"),
                job_name: "cryo1_J1".to_string(),
                job_type: cryoflow_core::StageKey::Motion,
                output_dir: PathBuf::from("/data/out"),
                command: "MotionCor2".to_string(),
                parameters: Default::default(),
                input_job_ids: vec![],
                execution_mode: cryoflow_core::ExecutionMode::Slurm,
                created_at_ms: 0,
            })
            .await
            .expect("insert job");
        store
            .record_event(&Event::JobStatusChanged {
                job_id: JobId::new("job-1"),
                status: cryoflow_core::JobStatus::Running,
                cluster_job_id: Some("slurm-99".to_string()),
            })
            .expect("record");
    }

    let reopened = DurableSessionStore::open(dir.path()).expect("reopen");
    let job = reopened
        .get_job(&JobId::new("job-1"))
        .await
        .expect("get")
        .expect("some");
    assert_eq!(job.status, cryoflow_core::JobStatus::Running);
    assert_eq!(job.cluster_job_id.as_deref(), Some("slurm-99"));
}
