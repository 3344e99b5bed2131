//! Mock backend for testing the client and CLI without the real service.
//!
//! The MockBackend binds a Unix socket in a temp dir and speaks the framed
//! protocol: one length-prefixed JSON request per connection, answered with
//! one length-prefixed JSON response.
//!
//! It is meant to catch real regressions:
//! 1. Requests are recorded exactly as received (catches envelope bugs)
//! 2. Responses are real frames (catches codec bugs)
//! 3. Failures are simulated at the byte level (hangs, early closes,
//!    oversized headers, malformed bodies)
//! 4. Connections closed by the client are counted (catches leaked sockets)

#![allow(dead_code)]

use serde_json::Value;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;
use tokio::net::UnixStream;
use tokio::sync::oneshot;

/// Recorded request for test verification
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub command: String,
    /// The whole decoded request object, envelope included.
    pub body: Value,
}

impl RecordedRequest {
    /// `params` of a nested request.
    pub fn params(&self) -> &Value {
        &self.body["params"]
    }
}

/// Configuration for how the mock should respond
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Send this JSON object as the response body
    Success(Value),
    /// Send `{"status": "error", "message": ...}`
    Error(String),
    /// Send these bytes as the body (for malformed payload tests)
    Malformed(Vec<u8>),
    /// Never answer; keep the connection open until the client closes it
    Hang,
    /// Close the connection without answering
    Disconnect,
    /// Send only a length header declaring this many bytes
    Oversized(u32),
    /// Send a header and then close partway through the body
    Truncated,
    /// Return different responses for each call (cycles through the list)
    Sequence(Vec<MockResponse>),
    /// Delay before returning the response
    Delayed(Duration, Box<MockResponse>),
}

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    handlers: Mutex<HashMap<String, MockResponse>>,
    sequence_counters: Mutex<HashMap<String, usize>>,
    connections: AtomicUsize,
    closed_by_client: AtomicUsize,
}

pub struct MockBackend {
    _temp_dir: TempDir,
    socket_path: PathBuf,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shared: Arc<Shared>,
}

/// Three elements, labelled A, B and C by the client.
pub fn default_elements() -> Value {
    json!([
        {"id": 101, "x": 10.0, "y": 20.0, "w": 80.0, "h": 24.0, "name": "OK", "role": "push button"},
        {"id": "menu-file", "x": 5.0, "y": 2.0, "name": "File", "role": "menu item"},
        {"id": 303, "x": 400.0, "y": 300.0, "role": "link"}
    ])
}

/// `count` elements with ids 0..count, for label-space tests.
pub fn numbered_elements(count: u64) -> Value {
    Value::Array(
        (0..count)
            .map(|i| json!({"id": i, "x": i as f64, "y": (2 * i) as f64}))
            .collect(),
    )
}

impl MockBackend {
    /// Create and start a new mock backend
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let socket_path = temp_dir.path().join("llamiv.sock");
        let shared = Arc::new(Shared::default());

        {
            let mut h = shared.handlers.lock().unwrap();
            h.insert(
                "PING".to_string(),
                MockResponse::Success(json!({"status": "pong"})),
            );
            h.insert(
                "SCAN".to_string(),
                MockResponse::Success(json!({
                    "status": "success",
                    "elements": default_elements()
                })),
            );
            h.insert(
                "CLICK".to_string(),
                MockResponse::Success(json!({"status": "success"})),
            );
            h.insert(
                "SCROLL".to_string(),
                MockResponse::Success(json!({"status": "success"})),
            );
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let listener = UnixListener::bind(&socket_path).expect("Failed to bind socket");
        let server_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            Self::run_server(listener, server_shared, shutdown_rx).await;
        });

        Self {
            _temp_dir: temp_dir,
            socket_path,
            shutdown_tx: Some(shutdown_tx),
            shared,
        }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Set a custom response for a command (e.g. "SCAN")
    pub fn set_response(&self, command: &str, response: MockResponse) {
        self.shared
            .handlers
            .lock()
            .unwrap()
            .insert(command.to_string(), response);
    }

    /// Answer SCAN with these elements
    pub fn set_elements(&self, elements: Value) {
        self.set_response(
            "SCAN",
            MockResponse::Success(json!({"status": "success", "elements": elements})),
        );
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.shared.requests.lock().unwrap().clear();
    }

    pub fn last_request_for(&self, command: &str) -> Option<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.command == command)
            .cloned()
    }

    pub fn call_count_for(&self, command: &str) -> usize {
        self.shared
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.command == command)
            .count()
    }

    /// Number of connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Number of held connections (Hang, Oversized) the client has closed
    pub fn closed_by_client(&self) -> usize {
        self.shared.closed_by_client.load(Ordering::SeqCst)
    }

    /// Waits up to `within` for the client to close `expected` held connections.
    pub async fn wait_for_client_close(&self, expected: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.closed_by_client() >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.closed_by_client() >= expected
    }

    /// Environment variables pointing the CLI at this backend
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![(
            "LLAMIV_SOCKET",
            self.socket_path.to_string_lossy().into_owned(),
        )]
    }

    async fn run_server(
        listener: UnixListener,
        shared: Arc<Shared>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            shared.connections.fetch_add(1, Ordering::SeqCst);
                            let shared = Arc::clone(&shared);
                            tokio::spawn(async move {
                                Self::handle_connection(stream, shared).await;
                            });
                        }
                        Err(e) => {
                            eprintln!("Mock backend accept error: {}", e);
                            break;
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }
    }

    async fn handle_connection(mut stream: UnixStream, shared: Arc<Shared>) {
        let mut header = [0u8; 4];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let len = u32::from_be_bytes(header) as usize;
        let mut body = vec![0u8; len];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }

        let request: Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Mock backend parse error: {}", e);
                return;
            }
        };
        let command = request["command"].as_str().unwrap_or_default().to_string();
        shared.requests.lock().unwrap().push(RecordedRequest {
            command: command.clone(),
            body: request,
        });

        let handler = shared.handlers.lock().unwrap().get(&command).cloned();
        let handler = Self::resolve_handler(handler, &command, &shared);
        Self::respond(stream, handler, &shared).await;
    }

    fn resolve_handler(
        handler: Option<MockResponse>,
        command: &str,
        shared: &Shared,
    ) -> MockResponse {
        match handler {
            Some(MockResponse::Sequence(responses)) if !responses.is_empty() => {
                let response = {
                    let mut counters = shared.sequence_counters.lock().unwrap();
                    let index = counters.entry(command.to_string()).or_insert(0);
                    let response = responses[*index % responses.len()].clone();
                    *index += 1;
                    response
                };
                Self::resolve_handler(Some(response), command, shared)
            }
            Some(other) => other,
            None => MockResponse::Error(format!("Unknown command: {}", command)),
        }
    }

    async fn respond(mut stream: UnixStream, mut handler: MockResponse, shared: &Shared) {
        let handler = loop {
            match handler {
                MockResponse::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    handler = *inner;
                }
                other => break other,
            }
        };

        match handler {
            MockResponse::Success(value) => {
                let body = serde_json::to_vec(&value).unwrap();
                write_frame(&mut stream, &body).await;
            }
            MockResponse::Error(message) => {
                let body = serde_json::to_vec(&json!({"status": "error", "message": message}))
                    .unwrap();
                write_frame(&mut stream, &body).await;
            }
            MockResponse::Malformed(bytes) => {
                write_frame(&mut stream, &bytes).await;
            }
            MockResponse::Hang => {
                wait_for_close(&mut stream, shared).await;
            }
            MockResponse::Disconnect => {}
            MockResponse::Oversized(declared) => {
                let _ = stream.write_all(&declared.to_be_bytes()).await;
                let _ = stream.flush().await;
                wait_for_close(&mut stream, shared).await;
            }
            MockResponse::Truncated => {
                let _ = stream.write_all(&100u32.to_be_bytes()).await;
                let _ = stream.write_all(b"{\"status\":").await;
                let _ = stream.flush().await;
            }
            MockResponse::Sequence(_) | MockResponse::Delayed(..) => {
                eprintln!("Mock backend: nested Sequence inside Delayed is not supported");
            }
        }
    }
}

async fn write_frame(stream: &mut UnixStream, body: &[u8]) {
    let mut frame = (body.len() as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(body);
    let _ = stream.write_all(&frame).await;
    let _ = stream.flush().await;
}

/// Reads until EOF, which is how the client's close shows up on this side.
async fn wait_for_close(stream: &mut UnixStream, shared: &Shared) {
    let mut buf = [0u8; 64];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }
    shared.closed_by_client.fetch_add(1, Ordering::SeqCst);
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
