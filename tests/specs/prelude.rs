//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

// Aggressive timeouts for fast tests.
const TIMEOUT_CONNECT_MS: &str = "2000";
const TIMEOUT_IPC_MS: &str = "1000";
const CONNECT_POLL_MS: &str = "5";

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn cryoflow_binary() -> PathBuf {
    binary_path("cryoflow")
}

pub fn cryoflowd_binary() -> PathBuf {
    binary_path("cryoflowd")
}

/// Per-test isolated state directory so concurrently running tests never
/// share a daemon socket or durable store.
pub struct TestEnv {
    _dir: tempfile::TempDir,
    state_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let state_dir = dir.path().join("state");
        Self { _dir: dir, state_dir }
    }

    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.state_dir.clone())
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    state_dir: PathBuf,
}

impl CliBuilder {
    fn new(state_dir: PathBuf) -> Self {
        Self { args: Vec::new(), state_dir }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(cryoflow_binary());
        cmd.args(&self.args);
        cmd.env("CRYOFLOW_STATE_DIR", &self.state_dir);
        cmd.env("CRYOFLOW_DAEMON_BINARY", cryoflowd_binary());
        cmd.env("CRYOFLOW_TIMEOUT_CONNECT_MS", TIMEOUT_CONNECT_MS);
        cmd.env("CRYOFLOW_TIMEOUT_IPC_MS", TIMEOUT_IPC_MS);
        cmd.env("CRYOFLOW_CONNECT_POLL_MS", CONNECT_POLL_MS);
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}
