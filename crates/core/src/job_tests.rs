use super::*;
use crate::clock::FakeClock;

fn config() -> JobConfig {
    JobConfig {
        id: JobId::new("job-1"),
        project_id: ProjectId::new("proj-1"),
        user_id: UserId::new("alice"),
        session_id: "sess-1".to_string(),
        job_name: "proj-1_J1".to_string(),
        job_type: StageKey::Motion,
        output_dir: PathBuf::from("/data/proj-1/J1"),
        command: "MotionCor2".to_string(),
        parameters: HashMap::new(),
        input_job_ids: vec![JobId::new("job-0")],
        execution_mode: ExecutionMode::Slurm,
    }
}

#[test]
fn new_job_starts_pending_with_no_timestamps() {
    let clock = FakeClock::at(1_000);
    let job = Job::new(config(), &clock);
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.start_time_ms.is_none());
    assert!(job.end_time_ms.is_none());
    assert_eq!(job.created_at_ms, 1_000);
}

#[test]
fn mark_running_then_success_computes_duration() {
    let clock = FakeClock::at(1_000);
    let mut job = Job::new(config(), &clock);
    job.mark_running(1_000);
    job.mark_success(
        1_500,
        PipelineStats {
            micrograph_count: Some(42),
            ..PipelineStats::default()
        },
    );
    assert_eq!(job.status, JobStatus::Success);
    assert_eq!(job.duration_ms(), Some(500));
    assert_eq!(job.pipeline_stats.micrograph_count, Some(42));
}

#[test]
fn mark_failed_records_error_message() {
    let clock = FakeClock::at(1_000);
    let mut job = Job::new(config(), &clock);
    job.mark_running(1_000);
    job.mark_failed(1_200, "out of memory");
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("out of memory"));
}

#[test]
fn duration_is_none_until_both_timestamps_present() {
    let clock = FakeClock::at(1_000);
    let job = Job::new(config(), &clock);
    assert_eq!(job.duration_ms(), None);
}

#[test]
fn with_cluster_job_id_sets_field() {
    let clock = FakeClock::at(1_000);
    let job = Job::new(config(), &clock).with_cluster_job_id("12345");
    assert_eq!(job.cluster_job_id.as_deref(), Some("12345"));
}
