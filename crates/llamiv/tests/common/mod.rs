#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_backend;
pub mod test_harness;

pub use mock_backend::MockBackend;
pub use mock_backend::MockResponse;
pub use mock_backend::RecordedRequest;
pub use mock_backend::default_elements;
pub use mock_backend::numbered_elements;
pub use test_harness::TestHarness;

use assert_cmd::Command;
use llamiv_ipc::ClientConfig;
use llamiv_ipc::UnixSocketClient;
use std::time::Duration;

pub fn llamiv_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("llamiv"));
    cmd.env_remove("LLAMIV_SOCKET")
        .env_remove("LLAMIV_TIMEOUT_MS")
        .env_remove("LLAMIV_ENVELOPE")
        .env_remove("LLAMIV_LOG")
        .env("RUST_LOG", "off")
        .env("NO_COLOR", "1");
    cmd
}

/// A client for `backend` with the given per-call timeout.
pub fn client_for(backend: &MockBackend, timeout: Duration) -> UnixSocketClient {
    UnixSocketClient::new(
        ClientConfig::from_env()
            .with_socket_path(backend.socket_path())
            .with_timeout(timeout),
    )
}
