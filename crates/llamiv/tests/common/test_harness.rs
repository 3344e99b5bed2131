//! Synchronous wrapper around [`MockBackend`] for CLI tests.

#![allow(dead_code)]

use super::llamiv_cmd;
use super::mock_backend::MockBackend;
use super::mock_backend::MockResponse;
use super::mock_backend::RecordedRequest;
use assert_cmd::Command;
use tokio::runtime::Runtime;

/// Owns a multi-threaded runtime so the backend keeps serving while the
/// test thread blocks on the CLI process.
pub struct TestHarness {
    backend: MockBackend,
    runtime: Runtime,
}

impl TestHarness {
    pub fn new() -> Self {
        let runtime = Runtime::new().expect("Failed to create tokio runtime");
        let backend = runtime.block_on(MockBackend::start());
        Self { backend, runtime }
    }

    /// A `llamiv` command pointed at the mock backend.
    pub fn cli_command(&self) -> Command {
        let mut cmd = llamiv_cmd();
        for (key, value) in self.backend.env_vars() {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cli_command().args(args).assert()
    }

    pub fn backend(&self) -> &MockBackend {
        &self.backend
    }

    pub fn set_response(&self, command: &str, response: MockResponse) {
        self.backend.set_response(command, response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.backend.get_requests()
    }

    pub fn last_request_for(&self, command: &str) -> Option<RecordedRequest> {
        self.backend.last_request_for(command)
    }

    pub fn assert_command_called(&self, command: &str) {
        let requests = self.get_requests();
        assert!(
            requests.iter().any(|r| r.command == command),
            "Expected command '{}' to be sent, but it wasn't. Sent: {:?}",
            command,
            requests.iter().map(|r| &r.command).collect::<Vec<_>>()
        );
    }
}
