use std::path::Path;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tracing::debug;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::frame;
use crate::frame::LENGTH_PREFIX_BYTES;
use crate::types::Request;
use crate::types::Response;

/// Sends one request to the backend and returns its response.
///
/// Implementations hold no state shared between calls, so a client can be
/// cloned into fire-and-forget tasks freely.
#[async_trait]
pub trait IpcClient: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

/// Talks to the backend over a Unix domain socket, one connection per request.
#[derive(Debug, Clone)]
pub struct UnixSocketClient {
    config: ClientConfig,
}

impl UnixSocketClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Like [`IpcClient::send`] but with an explicit deadline.
    ///
    /// The deadline covers connecting, writing and reading. When it expires
    /// the in-flight exchange is dropped, which closes the socket.
    pub async fn send_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, TransportError> {
        let frame = frame::encode(request, self.config.envelope)?;
        let started = Instant::now();

        debug!(
            command = %request.command,
            socket = %self.config.socket_path.display(),
            bytes = frame.len(),
            "Sending request"
        );

        let result = match tokio::time::timeout(timeout, self.round_trip(&frame)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(TransportError::Timeout { after: timeout }),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => debug!(
                command = %request.command,
                status = %response.status,
                elapsed_ms,
                "Received response"
            ),
            Err(err) => warn!(command = %request.command, elapsed_ms, error = %err, "Request failed"),
        }
        result
    }

    async fn round_trip(&self, frame: &[u8]) -> Result<Response, TransportError> {
        let mut stream = connect(&self.config.socket_path).await?;
        // `stream` is dropped, and the socket closed, on every exit path.
        exchange(&mut stream, frame, self.config.max_response_bytes).await
    }
}

#[async_trait]
impl IpcClient for UnixSocketClient {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.send_with_timeout(&request, self.config.timeout).await
    }
}

async fn connect(path: &Path) -> Result<UnixStream, TransportError> {
    UnixStream::connect(path)
        .await
        .map_err(|source| TransportError::ConnectFailed {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes one request frame and reads one response frame from `stream`.
pub(crate) async fn exchange<S>(
    stream: &mut S,
    frame: &[u8],
    max_response_bytes: u32,
) -> Result<Response, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(frame)
        .await
        .map_err(TransportError::WriteFailed)?;
    stream.flush().await.map_err(TransportError::WriteFailed)?;

    let mut header = [0u8; LENGTH_PREFIX_BYTES];
    stream
        .read_exact(&mut header)
        .await
        .map_err(TransportError::from_read)?;

    let declared = frame::decode_response_header(header);
    if declared > max_response_bytes {
        return Err(TransportError::ResponseTooLarge {
            declared,
            max: max_response_bytes,
        });
    }

    let mut body = vec![0u8; declared as usize];
    stream
        .read_exact(&mut body)
        .await
        .map_err(TransportError::from_read)?;

    Ok(frame::decode_response_body(&body)?)
}
