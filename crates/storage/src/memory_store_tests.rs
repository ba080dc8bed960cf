use super::*;
use crate::store::{NewJob, SessionStore};
use cryoflow_core::{
    ExecutionMode, InputMode, JobId, Project, ProjectId, Session, SessionConfig, SessionId,
    SessionStatus, StageKey, UserId,
};
use std::collections::HashMap;
use std::path::PathBuf;

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

fn new_job(id: &str, session_id: &str) -> NewJob {
    NewJob {
        id: JobId::new(id),
        project_id: ProjectId::new("proj-1"),
        user_id: UserId::new("alice"),
        session_id: SessionId::new(session_id),
        job_name: "cryo1_J1".to_string(),
        job_type: StageKey::Motion,
        output_dir: PathBuf::from("/data/out"),
        command: "MotionCor2".to_string(),
        parameters: HashMap::new(),
        input_job_ids: vec![],
        execution_mode: ExecutionMode::Slurm,
        created_at_ms: 0,
    }
}

#[tokio::test]
async fn insert_then_get_session_round_trips() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    let found = store
        .get_session(&SessionId::new("sess-1"))
        .await
        .expect("get")
        .expect("some");
    assert_eq!(found.id, SessionId::new("sess-1"));
}

#[tokio::test]
async fn inserting_duplicate_session_fails() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    let err = store.insert_session(session("sess-1")).await.unwrap_err();
    assert!(matches!(err, StoreError::SessionExists(_)));
}

#[tokio::test]
async fn raise_movies_found_uses_max_semantics() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    let id = SessionId::new("sess-1");

    store.raise_movies_found(&id, 7).await.expect("raise");
    store.raise_movies_found(&id, 3).await.expect("raise");
    let found = store.get_session(&id).await.expect("get").expect("some");
    assert_eq!(found.state.movies_found, 7);
}

#[tokio::test]
async fn set_session_job_slot_then_find_by_job_id() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    let id = SessionId::new("sess-1");
    store
        .set_session_job_slot(&id, StageKey::Ctf, JobId::new("job-ctf"))
        .await
        .expect("set slot");

    let found = store
        .find_session_by_job_id(&JobId::new("job-ctf"))
        .await
        .expect("find")
        .expect("some");
    assert_eq!(found.id, id);
}

#[tokio::test]
async fn delete_session_then_get_returns_none() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    let id = SessionId::new("sess-1");
    store.delete_session(&id).await.expect("delete");
    assert!(store.get_session(&id).await.expect("get").is_none());
}

#[tokio::test]
async fn list_sessions_with_status_filters_correctly() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    store.insert_session(session("sess-2")).await.expect("insert");
    store
        .set_session_status(&SessionId::new("sess-1"), SessionStatus::Running)
        .await
        .expect("set status");

    let running = store
        .list_sessions_with_status(SessionStatus::Running)
        .await
        .expect("list");
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, SessionId::new("sess-1"));
}

#[tokio::test]
async fn list_sessions_for_project_filters_out_other_projects() {
    let store = InMemoryStore::new();
    store.insert_session(session("sess-1")).await.expect("insert");
    store.insert_session(session("sess-2")).await.expect("insert");
    let other = Session::new(
        SessionId::new("sess-3"),
        ProjectId::new("proj-2"),
        UserId::new("alice"),
        "test",
        InputMode::Watch,
        PathBuf::from("/data"),
        "*.tiff",
        SessionConfig::default(),
        0,
    );
    store.insert_session(other).await.expect("insert");

    let sessions = store
        .list_sessions_for_project(&ProjectId::new("proj-1"))
        .await
        .expect("list");
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s.project_id == ProjectId::new("proj-1")));
}

#[tokio::test]
async fn insert_job_then_mark_success_updates_stats() {
    let store = InMemoryStore::new();
    store.insert_job(new_job("job-1", "sess-1")).await.expect("insert");
    let id = JobId::new("job-1");
    store
        .mark_job_success(
            &id,
            1000,
            cryoflow_core::PipelineStats {
                micrograph_count: Some(10),
                ..Default::default()
            },
        )
        .await
        .expect("mark success");

    let job = store.get_job(&id).await.expect("get").expect("some");
    assert_eq!(job.status, cryoflow_core::JobStatus::Success);
    assert_eq!(job.pipeline_stats.micrograph_count, Some(10));
}

#[tokio::test]
async fn allocate_job_name_increments_across_calls() {
    let store = InMemoryStore::new();
    store
        .insert_project(Project::new(ProjectId::new("proj-1"), "cryo1"))
        .await
        .expect("insert project");

    let first = store
        .allocate_job_name(&ProjectId::new("proj-1"))
        .await
        .expect("allocate");
    let second = store
        .allocate_job_name(&ProjectId::new("proj-1"))
        .await
        .expect("allocate");
    assert_eq!(first, "cryo1_J1");
    assert_eq!(second, "cryo1_J2");
}

#[tokio::test]
async fn delete_jobs_for_session_removes_only_matching_jobs() {
    let store = InMemoryStore::new();
    store.insert_job(new_job("job-1", "sess-1")).await.expect("insert");
    store.insert_job(new_job("job-2", "sess-2")).await.expect("insert");

    store
        .delete_jobs_for_session(&SessionId::new("sess-1"))
        .await
        .expect("delete");

    assert!(store
        .get_job(&JobId::new("job-1"))
        .await
        .expect("get")
        .is_none());
    assert!(store
        .get_job(&JobId::new("job-2"))
        .await
        .expect("get")
        .is_some());
}
