use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::Status;

/// The payload of a frame could not be produced or understood.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Payload of {len} bytes does not fit a 4-byte length prefix")]
    FrameTooLarge { len: usize },
}

/// A single request/response exchange failed before a well-formed response arrived.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to backend at {}: {source}", .path.display())]
    ConnectFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write request: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("Failed to read response: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("Connection closed before the full response arrived")]
    ConnectionClosedEarly,

    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("Response declares {declared} bytes, limit is {max}")]
    ResponseTooLarge { declared: u32, max: u32 },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Maps a read-side I/O error, treating EOF as an early close.
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            TransportError::ConnectionClosedEarly
        } else {
            TransportError::ReadFailed(err)
        }
    }

    /// Whether re-issuing the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectFailed { .. }
                | TransportError::ConnectionClosedEarly
                | TransportError::Timeout { .. }
        )
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TransportError::ConnectFailed { .. } => Some(
                "Is the llamiv backend running? Start it or point LLAMIV_SOCKET at its socket.",
            ),
            TransportError::Timeout { .. } => {
                Some("The backend did not answer in time; raise LLAMIV_TIMEOUT_MS if it is busy.")
            }
            TransportError::ResponseTooLarge { .. } => {
                Some("Raise LLAMIV_MAX_RESPONSE_BYTES if the backend legitimately sends more.")
            }
            TransportError::Protocol(ProtocolError::MalformedPayload(_)) => Some(
                "The backend may expect a different request envelope; see LLAMIV_ENVELOPE.",
            ),
            _ => None,
        }
    }
}

/// The backend answered, but with a non-success status.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Backend returned status '{status}'{}", message_suffix(.message))]
pub struct ApplicationError {
    pub status: Status,
    pub message: Option<String>,
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}
