use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use llamiv_common::mutex_lock_or_recover;

use crate::client::IpcClient;
use crate::error::ProtocolError;
use crate::error::TransportError;
use crate::frame::MAX_RESPONSE_BYTES;
use crate::types::Command;
use crate::types::Request;
use crate::types::Response;

/// Transport failures a [`MockClient`] can be told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    ConnectFailed,
    ConnectionClosedEarly,
    Timeout,
    ResponseTooLarge,
    MalformedPayload,
}

impl MockFailure {
    fn into_error(self) -> TransportError {
        match self {
            MockFailure::ConnectFailed => TransportError::ConnectFailed {
                path: "/nonexistent/llamiv.sock".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock: no backend"),
            },
            MockFailure::ConnectionClosedEarly => TransportError::ConnectionClosedEarly,
            MockFailure::Timeout => TransportError::Timeout {
                after: Duration::from_millis(5000),
            },
            MockFailure::ResponseTooLarge => TransportError::ResponseTooLarge {
                declared: MAX_RESPONSE_BYTES + 1,
                max: MAX_RESPONSE_BYTES,
            },
            MockFailure::MalformedPayload => {
                TransportError::Protocol(ProtocolError::MalformedPayload("mock".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum MockOutcome {
    Respond(Response),
    Fail(MockFailure),
    /// Never completes; pair with a caller-side timeout.
    Hang,
}

/// In-memory [`IpcClient`] that records every request it is given.
#[derive(Clone)]
pub struct MockClient {
    outcomes: Arc<Mutex<HashMap<Command, MockOutcome>>>,
    calls: Arc<Mutex<Vec<Request>>>,
    default_outcome: MockOutcome,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_outcome: MockOutcome::Respond(Response::success()),
        }
    }

    /// Every command without an explicit outcome fails to connect.
    pub fn new_unreachable() -> Self {
        Self {
            default_outcome: MockOutcome::Fail(MockFailure::ConnectFailed),
            ..Self::new()
        }
    }

    pub fn set_outcome(&self, command: Command, outcome: MockOutcome) {
        mutex_lock_or_recover(&self.outcomes).insert(command, outcome);
    }

    pub fn set_response(&self, command: Command, response: Response) {
        self.set_outcome(command, MockOutcome::Respond(response));
    }

    pub fn set_failure(&self, command: Command, failure: MockFailure) {
        self.set_outcome(command, MockOutcome::Fail(failure));
    }

    pub fn get_calls(&self) -> Vec<Request> {
        mutex_lock_or_recover(&self.calls).clone()
    }

    pub fn call_count(&self, command: Command) -> usize {
        mutex_lock_or_recover(&self.calls)
            .iter()
            .filter(|r| r.command == command)
            .count()
    }

    pub fn last_call(&self, command: Command) -> Option<Request> {
        mutex_lock_or_recover(&self.calls)
            .iter()
            .rev()
            .find(|r| r.command == command)
            .cloned()
    }

    pub fn clear_calls(&self) {
        mutex_lock_or_recover(&self.calls).clear();
    }
}

#[async_trait]
impl IpcClient for MockClient {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let outcome = mutex_lock_or_recover(&self.outcomes)
            .get(&request.command)
            .cloned()
            .unwrap_or_else(|| self.default_outcome.clone());
        mutex_lock_or_recover(&self.calls).push(request);

        match outcome {
            MockOutcome::Respond(response) => Ok(response),
            MockOutcome::Fail(failure) => Err(failure.into_error()),
            MockOutcome::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use crate::types::Element;
    use crate::types::Status;

    #[tokio::test]
    async fn test_default_response_is_success() {
        let client = MockClient::new();
        let response = client.send(Request::ping()).await.unwrap();
        assert_eq!(response.status, Status::Success);
        assert_eq!(client.call_count(Command::Ping), 1);
    }

    #[tokio::test]
    async fn test_configured_response() {
        let client = MockClient::new();
        client.set_response(
            Command::Scan,
            Response::scanned(vec![Element::new("a", 1.0, 2.0)]),
        );

        let response = client.send(Request::scan()).await.unwrap();
        assert_eq!(response.elements.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let client = MockClient::new();
        client.set_failure(Command::Click, MockFailure::Timeout);

        let err = client.send(Request::click("x".into())).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_fails_every_command() {
        let client = MockClient::new_unreachable();
        let err = client.send(Request::scan()).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectFailed { .. }));
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let client = MockClient::new();
        client.send(Request::scroll(Direction::Up)).await.unwrap();
        client.send(Request::scroll(Direction::Down)).await.unwrap();

        let calls = client.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            client.last_call(Command::Scroll),
            Some(Request::scroll(Direction::Down))
        );

        client.clear_calls();
        assert!(client.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_hang_never_completes() {
        let client = MockClient::new();
        client.set_outcome(Command::Scan, MockOutcome::Hang);

        let result =
            tokio::time::timeout(Duration::from_millis(20), client.send(Request::scan())).await;
        assert!(result.is_err());
        assert_eq!(client.call_count(Command::Scan), 1);
    }
}
