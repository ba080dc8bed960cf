//! Deleting a session removes it regardless of whether it was running or
//! already stopped.

use crate::prelude::*;

fn create_session(env: &TestEnv, project_id: &str, session_name: &str) -> String {
    env.cli().args(&["create-project", project_id, "a project"]).passes();
    let output = env
        .cli()
        .args(&["create", project_id, "alice", session_name, "/data/grid", "--existing"])
        .passes();
    let session: serde_json::Value = serde_json::from_str(&output.stdout()).expect("session json");
    session["id"].as_str().expect("session id").to_string()
}

#[test]
fn deleting_a_running_session_stops_it_first_then_removes_it() {
    let env = TestEnv::new();
    let session_id = create_session(&env, "proj-1", "grid-1");

    env.cli().args(&["start", &session_id]).passes();
    env.cli().args(&["delete", &session_id]).passes();
    env.cli().args(&["get", &session_id]).fails().stderr_has("error");
}

#[test]
fn deleting_an_already_stopped_session_is_a_pure_cascade() {
    let env = TestEnv::new();
    let session_id = create_session(&env, "proj-1", "grid-2");

    env.cli().args(&["start", &session_id]).passes();
    env.cli().args(&["stop", &session_id]).passes();
    env.cli().args(&["delete", &session_id]).passes();
    env.cli().args(&["get", &session_id]).fails().stderr_has("error");
}
