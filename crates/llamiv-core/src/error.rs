use llamiv_ipc::ApplicationError;
use llamiv_ipc::TransportError;
use thiserror::Error;

/// Why entering a mode failed. The state machine is back in Idle whenever
/// one of these is returned.
#[derive(Error, Debug)]
pub enum ActivationError {
    #[error("Scan request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Scan rejected: {0}")]
    Application(#[from] ApplicationError),

    #[error("Overlay could not take keyboard focus")]
    ModalRefused,
}

impl ActivationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ActivationError::Transport(err) => err.is_retryable(),
            ActivationError::Application(_) => false,
            ActivationError::ModalRefused => true,
        }
    }
}
