//! Wire protocol and transport for talking to the llamiv accessibility backend.
//!
//! Every request opens a fresh Unix socket connection, writes one frame
//! (a 4-byte big-endian length followed by UTF-8 JSON), reads one frame
//! back and closes the connection.

#![deny(clippy::all)]

mod client;
mod config;
mod error;
pub mod frame;
mod mock_client;
mod socket;
mod types;

pub use client::IpcClient;
pub use client::UnixSocketClient;
pub use config::ClientConfig;
pub use config::DEFAULT_TIMEOUT;
pub use error::ApplicationError;
pub use error::ProtocolError;
pub use error::TransportError;
pub use frame::Envelope;
pub use frame::MAX_RESPONSE_BYTES;
pub use mock_client::MockClient;
pub use mock_client::MockFailure;
pub use mock_client::MockOutcome;
pub use types::Command;
pub use types::Direction;
pub use types::Element;
pub use types::ElementId;
pub use types::Request;
pub use types::Response;
pub use types::Status;

pub type Result<T> = std::result::Result<T, TransportError>;
