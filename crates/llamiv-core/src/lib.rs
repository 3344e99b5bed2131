//! Keyboard-driven element selection.
//!
//! Elements reported by the backend are tagged with short alphabetic labels;
//! the [`SelectionStateMachine`] turns keystrokes into label filtering and
//! dispatches `CLICK` and `SCROLL` commands through an [`IpcClient`].
//!
//! [`IpcClient`]: llamiv_ipc::IpcClient

#![deny(clippy::all)]

mod error;
pub mod hints;
pub mod keys;
mod renderer;
mod selection;

pub use error::ActivationError;
pub use hints::HintLabel;
pub use hints::LABEL_CAPACITY;
pub use hints::assign_labels;
pub use hints::label_for;
pub use keys::KeyEvent;
pub use keys::parse_key_sequence;
pub use renderer::OverlayRenderer;
pub use selection::Activation;
pub use selection::KeyDisposition;
pub use selection::Mode;
pub use selection::SelectionStateMachine;
pub use selection::SessionState;
