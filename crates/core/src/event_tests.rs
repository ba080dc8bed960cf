use super::*;

#[test]
fn files_added_serializes_with_type_tag() {
    let event = Event::FilesAdded {
        session_id: SessionId::new("sess-1"),
        files: vec![PathBuf::from("movie_0001.tiff")],
        count: 1,
    };
    let json = serde_json::to_value(&event).expect("serialize");
    assert_eq!(json["type"], "watch:files_added");
    assert_eq!(json["count"], 1);
}

#[test]
fn unknown_type_tag_deserializes_to_custom() {
    let json = r#"{"type":"future:event"}"#;
    let event: Event = serde_json::from_str(json).expect("deserialize");
    assert_eq!(event, Event::Custom);
}

#[test]
fn session_id_extracts_for_watch_events_only() {
    let files_added = Event::FilesAdded {
        session_id: SessionId::new("sess-1"),
        files: vec![],
        count: 0,
    };
    assert!(files_added.session_id().is_some());

    let status_changed = Event::JobStatusChanged {
        job_id: JobId::new("job-1"),
        status: JobStatus::Success,
        cluster_job_id: None,
    };
    assert!(status_changed.session_id().is_none());
}

#[test]
fn log_summary_includes_key_fields() {
    let event = Event::JobStatusChanged {
        job_id: JobId::new("job-1"),
        status: JobStatus::Failed,
        cluster_job_id: Some("12345".to_string()),
    };
    let summary = event.log_summary();
    assert!(summary.contains("job-1"));
    assert!(summary.contains("failed"));
}

#[test]
fn round_trips_job_status_changed_through_json() {
    let event = Event::JobStatusChanged {
        job_id: JobId::new("job-2"),
        status: JobStatus::Success,
        cluster_job_id: Some("999".to_string()),
    };
    let json = serde_json::to_string(&event).expect("serialize");
    let back: Event = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(event, back);
}
