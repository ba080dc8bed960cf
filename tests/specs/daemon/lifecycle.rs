//! Daemon lifecycle and control-protocol round trip (create -> start ->
//! activity all succeed against an auto-started daemon, in order).

use crate::prelude::*;

#[test]
fn create_start_and_activity_round_trip_through_the_socket() {
    let env = TestEnv::new();

    env.cli()
        .args(&["create-project", "proj-1", "grid study"])
        .passes();

    let create_output = env
        .cli()
        .args(&[
            "create",
            "proj-1",
            "alice",
            "grid-1",
            "/data/grid-1",
            "--file-pattern",
            "*.tiff",
        ])
        .passes();
    let session: serde_json::Value =
        serde_json::from_str(&create_output.stdout()).expect("session json");
    let session_id = session["id"].as_str().expect("session id").to_string();

    env.cli().args(&["start", &session_id]).passes();

    env.cli()
        .args(&["activity", &session_id])
        .passes()
        .stdout_has("[");
}

#[test]
fn get_an_unknown_session_fails() {
    let env = TestEnv::new();
    env.cli()
        .args(&["create-project", "proj-1", "grid study"])
        .passes();
    env.cli().args(&["get", "no-such-session"]).fails().stderr_has("error");
}
