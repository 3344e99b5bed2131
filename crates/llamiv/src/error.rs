//! CLI errors and their sysexits.h exit codes.

use std::io;
use std::time::Duration;

use llamiv_core::ActivationError;
use llamiv_ipc::ApplicationError;
use llamiv_ipc::ProtocolError;
use llamiv_ipc::TransportError;
use thiserror::Error;

use crate::supervisor::SupervisorError;

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const USAGE: i32 = 64;
    pub const UNAVAILABLE: i32 = 69;
    pub const OSERR: i32 = 71;
    pub const IOERR: i32 = 74;
    pub const TEMPFAIL: i32 = 75;
    pub const PROTOCOL: i32 = 76;
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("Backend did not answer PING within {}ms", .waited.as_millis())]
    BackendNotReady { waited: Duration },
}

impl CliError {
    /// The transport failure underneath, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            CliError::Transport(err) => Some(err),
            CliError::Activation(ActivationError::Transport(err)) => Some(err),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if let Some(err) = self.transport() {
            return match err {
                TransportError::ConnectFailed { .. } => exit_codes::UNAVAILABLE,
                TransportError::Timeout { .. } => exit_codes::TEMPFAIL,
                TransportError::ResponseTooLarge { .. }
                | TransportError::Protocol(ProtocolError::MalformedPayload(_)) => {
                    exit_codes::PROTOCOL
                }
                TransportError::Protocol(_) => exit_codes::USAGE,
                _ => exit_codes::IOERR,
            };
        }
        match self {
            CliError::Application(_) | CliError::Activation(ActivationError::Application(_)) => {
                exit_codes::GENERAL_ERROR
            }
            CliError::Activation(ActivationError::ModalRefused) => exit_codes::TEMPFAIL,
            CliError::Supervisor(_) | CliError::Runtime(_) => exit_codes::OSERR,
            CliError::BackendNotReady { .. } => exit_codes::UNAVAILABLE,
            CliError::Transport(_) | CliError::Activation(ActivationError::Transport(_)) => {
                exit_codes::IOERR
            }
        }
    }
}
