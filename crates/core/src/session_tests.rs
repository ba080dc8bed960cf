use super::*;
use crate::activity::ActivityEntry;

fn new_session() -> Session {
    Session::new(
        SessionId::new("sess-1"),
        ProjectId::new("proj-1"),
        UserId::new("alice"),
        "test-session",
        InputMode::Watch,
        PathBuf::from("/data/raw"),
        "*.tiff",
        SessionConfig::default(),
        1_000,
    )
}

#[test]
fn new_session_starts_pending_with_empty_state() {
    let session = new_session();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.state.pass_count, 0);
    assert!(session.jobs.import_id.is_none());
    assert!(session.activity_log.is_empty());
}

#[test]
fn job_slots_main_line_set_once_class2d_accumulates() {
    let mut slots = JobSlots::default();
    slots.set_slot(StageKey::Motion, JobId::new("job-1"));
    slots.set_slot(StageKey::Class2d, JobId::new("job-2"));
    slots.set_slot(StageKey::Class2d, JobId::new("job-3"));
    assert_eq!(slots.motion_id, Some(JobId::new("job-1")));
    assert_eq!(slots.class2d_ids.len(), 2);
    assert_eq!(slots.slot_for(StageKey::Class2d), Some(&JobId::new("job-3")));
}

#[test]
fn counters_monotonic_holds_for_well_formed_state() {
    let mut session = new_session();
    session.state.movies_found = 10;
    session.state.movies_imported = 10;
    session.state.movies_motion = 8;
    session.state.movies_ctf = 8;
    session.state.movies_picked = 5;
    assert!(session.counters_monotonic());
}

#[test]
fn counters_monotonic_fails_when_downstream_exceeds_upstream() {
    let mut session = new_session();
    session.state.movies_found = 5;
    session.state.movies_imported = 10;
    assert!(!session.counters_monotonic());
}

#[test]
fn push_activity_appends_in_order() {
    let mut session = new_session();
    session.push_activity(ActivityEntry::info("first", 1));
    session.push_activity(ActivityEntry::info("second", 2));
    assert_eq!(session.activity_log.len(), 2);
    assert_eq!(session.activity_log[0].message, "first");
}

#[test]
fn session_status_terminal_states() {
    assert!(SessionStatus::Stopped.is_terminal());
    assert!(SessionStatus::Completed.is_terminal());
    assert!(!SessionStatus::Running.is_terminal());
}
