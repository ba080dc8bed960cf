use super::*;
use cryoflow_core::{ActivityLevel, SessionId};
use serde_json::json;

fn update() -> LiveUpdate {
    LiveUpdate {
        session_id: SessionId::new("sess-1"),
        event: "new_files".to_string(),
        level: ActivityLevel::Info,
        data: json!({}),
        timestamp_ms: 1,
    }
}

#[test]
fn publish_records_the_call() {
    let notifier = FakeNotifier::new();
    let project_id = ProjectId::new("proj-1");
    notifier.publish(&project_id, update());

    let published = notifier.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, project_id);
    assert_eq!(published[0].1.event, "new_files");
}

#[tokio::test]
async fn subscribers_receive_published_updates() {
    let notifier = FakeNotifier::new();
    let project_id = ProjectId::new("proj-1");
    let mut rx = notifier.subscribe(&project_id);

    notifier.publish(&project_id, update());

    let received = rx.recv().await.unwrap();
    assert_eq!(received.event, "new_files");
}
