//! `cryoflow --help` should describe the control verbs without needing a
//! running daemon.

use crate::prelude::*;

#[test]
fn help_lists_the_control_verbs_without_starting_a_daemon() {
    let env = TestEnv::new();
    env.cli()
        .args(&["--help"])
        .passes()
        .stdout_has("create-project")
        .stdout_has("start")
        .stdout_has("stop");
}

#[test]
fn unknown_subcommand_fails_with_a_usage_error() {
    let env = TestEnv::new();
    env.cli().args(&["bogus-verb"]).fails().stderr_has("error");
}
