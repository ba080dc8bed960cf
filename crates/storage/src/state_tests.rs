use super::*;
use cryoflow_core::{InputMode, JobConfig, JobId, ProjectId, SessionConfig, UserId};
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

fn job(id: &str) -> Job {
    Job::new_with_epoch_ms(
        JobConfig {
            id: JobId::new(id),
            project_id: ProjectId::new("proj-1"),
            user_id: UserId::new("alice"),
            session_id: "sess-1".to_string(),
            job_name: "cryo1_J1".to_string(),
            job_type: cryoflow_core::StageKey::Motion,
            output_dir: PathBuf::from("/data/out"),
            command: "MotionCor2".to_string(),
            parameters: HashMap::new(),
            input_job_ids: vec![],
            execution_mode: cryoflow_core::ExecutionMode::Slurm,
        },
        0,
    )
}

#[test]
fn files_added_raises_movies_found_with_max_semantics() {
    let mut state = MaterializedState::default();
    let mut s = session("sess-1");
    s.state.movies_found = 5;
    state.sessions.insert("sess-1".to_string(), s);

    state.apply_event(&Event::FilesAdded {
        session_id: SessionId::new("sess-1"),
        files: vec![],
        count: 3,
    });
    assert_eq!(state.sessions["sess-1"].state.movies_found, 5);

    state.apply_event(&Event::FilesAdded {
        session_id: SessionId::new("sess-1"),
        files: vec![],
        count: 10,
    });
    assert_eq!(state.sessions["sess-1"].state.movies_found, 10);
}

#[test]
fn job_status_changed_updates_status_and_cluster_id() {
    let mut state = MaterializedState::default();
    state.jobs.insert("job-1".to_string(), job("job-1"));

    state.apply_event(&Event::JobStatusChanged {
        job_id: JobId::new("job-1"),
        status: JobStatus::Success,
        cluster_job_id: Some("12345".to_string()),
    });
    let j = &state.jobs["job-1"];
    assert_eq!(j.status, JobStatus::Success);
    assert_eq!(j.cluster_job_id.as_deref(), Some("12345"));
}

#[test]
fn terminal_job_status_is_not_regressed_by_stale_duplicate() {
    let mut state = MaterializedState::default();
    let mut j = job("job-1");
    j.status = JobStatus::Success;
    state.jobs.insert("job-1".to_string(), j);

    state.apply_event(&Event::JobStatusChanged {
        job_id: JobId::new("job-1"),
        status: JobStatus::Running,
        cluster_job_id: None,
    });
    assert_eq!(state.jobs["job-1"].status, JobStatus::Success);
}

#[test]
fn find_session_by_job_id_checks_all_slots() {
    let mut state = MaterializedState::default();
    let mut s = session("sess-1");
    s.jobs.ctf_id = Some(JobId::new("job-ctf"));
    state.sessions.insert("sess-1".to_string(), s);

    let found = state.find_session_by_job_id("job-ctf");
    assert!(found.is_some());
    assert!(state.find_session_by_job_id("job-missing").is_none());
}
