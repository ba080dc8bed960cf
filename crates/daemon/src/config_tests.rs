use super::*;
use serial_test::serial;

#[test]
#[serial]
fn state_dir_env_var_overrides_default() {
    std::env::set_var("CRYOFLOW_STATE_DIR", "/tmp/cryoflow-test-state");
    std::env::remove_var("CRYOFLOW_PROJECTS_DIR");
    let config = Config::load().expect("load");
    assert_eq!(config.state_dir, PathBuf::from("/tmp/cryoflow-test-state"));
    assert_eq!(config.socket_path, PathBuf::from("/tmp/cryoflow-test-state/daemon.sock"));
    assert_eq!(config.projects_root, PathBuf::from("/tmp/cryoflow-test-state/projects"));
    std::env::remove_var("CRYOFLOW_STATE_DIR");
}

#[test]
#[serial]
fn projects_dir_env_var_overrides_the_state_dir_default() {
    std::env::set_var("CRYOFLOW_STATE_DIR", "/tmp/cryoflow-test-state-2");
    std::env::set_var("CRYOFLOW_PROJECTS_DIR", "/tmp/cryoflow-test-projects");
    let config = Config::load().expect("load");
    assert_eq!(config.projects_root, PathBuf::from("/tmp/cryoflow-test-projects"));
    std::env::remove_var("CRYOFLOW_STATE_DIR");
    std::env::remove_var("CRYOFLOW_PROJECTS_DIR");
}
