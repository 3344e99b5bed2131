use std::sync::Arc;

use llamiv_ipc::Command;
use llamiv_ipc::Direction;
use llamiv_ipc::IpcClient;
use llamiv_ipc::Request;
use llamiv_ipc::Response;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error::ActivationError;
use crate::hints::HintLabel;
use crate::hints::assign_labels;
use crate::keys::KeyEvent;
use crate::renderer::OverlayRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    Hint,
    Scroll,
}

/// The one active session. The input buffer and labels are only ever
/// non-empty in [`Mode::Hint`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    mode: Mode,
    input_buffer: String,
    labels: Vec<HintLabel>,
}

impl SessionState {
    fn hint(labels: Vec<HintLabel>) -> Self {
        Self {
            mode: Mode::Hint,
            input_buffer: String::new(),
            labels,
        }
    }

    fn scroll() -> Self {
        Self {
            mode: Mode::Scroll,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn labels(&self) -> &[HintLabel] {
        &self.labels
    }

    pub fn visible_labels(&self) -> impl Iterator<Item = &HintLabel> {
        self.labels.iter().filter(|l| l.visible)
    }
}

/// Result of an activation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Started,
    /// A session is already running; nothing was done.
    AlreadyActive,
}

/// Whether a key was swallowed by the overlay or should reach the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Consumed,
    PassThrough,
}

/// Owns the session and turns keystrokes into filtering and backend commands.
///
/// `SCROLL` and `CLICK` are fire-and-forget: they run as tasks on the
/// current runtime, their failures are logged, and their outcomes never
/// change the mode.
pub struct SelectionStateMachine<C, R> {
    client: Arc<C>,
    renderer: R,
    state: SessionState,
    modal_held: bool,
    in_flight: JoinSet<()>,
}

impl<C, R> SelectionStateMachine<C, R>
where
    C: IpcClient + 'static,
    R: OverlayRenderer,
{
    pub fn new(client: Arc<C>, renderer: R) -> Self {
        Self {
            client,
            renderer,
            state: SessionState::default(),
            modal_held: false,
            in_flight: JoinSet::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Number of dispatched commands that have not been reaped yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Scans for elements and enters hint mode.
    ///
    /// Does nothing unless idle. Any failure leaves the machine idle.
    pub async fn activate_hint(&mut self) -> Result<Activation, ActivationError> {
        if self.state.mode != Mode::Idle {
            debug!(mode = ?self.state.mode, "Ignoring hint activation; session already active");
            return Ok(Activation::AlreadyActive);
        }

        let response = match self.scan().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Hint activation failed");
                self.deactivate();
                return Err(err);
            }
        };

        let labels = assign_labels(response.elements.as_deref().unwrap_or_default());

        if !self.take_modal() {
            warn!("Overlay refused keyboard focus; leaving hint mode");
            self.deactivate();
            return Err(ActivationError::ModalRefused);
        }

        info!(labels = labels.len(), "Hint mode active");
        self.state = SessionState::hint(labels);
        self.renderer.show_labels(&self.state.labels);
        Ok(Activation::Started)
    }

    async fn scan(&self) -> Result<Response, ActivationError> {
        let response = self.client.send(Request::scan()).await?;
        Ok(response.into_result_for(Command::Scan)?)
    }

    /// Enters scroll mode without talking to the backend.
    pub fn activate_scroll(&mut self) -> Result<Activation, ActivationError> {
        if self.state.mode != Mode::Idle {
            debug!(mode = ?self.state.mode, "Ignoring scroll activation; session already active");
            return Ok(Activation::AlreadyActive);
        }

        self.state = SessionState::default();
        self.renderer.show_labels(&[]);

        if !self.take_modal() {
            warn!("Overlay refused keyboard focus; leaving scroll mode");
            self.deactivate();
            return Err(ActivationError::ModalRefused);
        }

        info!("Scroll mode active");
        self.state = SessionState::scroll();
        self.renderer.show_scroll_indicator(true);
        Ok(Activation::Started)
    }

    /// Feeds one key to the active session. Every key is consumed while a
    /// session is active; in idle they pass through.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyDisposition {
        match (self.state.mode, key) {
            (Mode::Idle, _) => return KeyDisposition::PassThrough,
            (_, KeyEvent::Escape) => {
                debug!("Escape pressed; closing overlay");
                self.deactivate();
            }
            (Mode::Scroll, KeyEvent::Character(c)) => {
                if let Some(direction) = Direction::from_vi_key(c) {
                    self.scroll(direction);
                }
            }
            (Mode::Scroll, KeyEvent::Backspace) => {}
            (Mode::Hint, KeyEvent::Backspace) => {
                self.state.input_buffer.pop();
                self.filter();
            }
            (Mode::Hint, KeyEvent::Character(c)) if c.is_ascii_alphabetic() => {
                self.state.input_buffer.push(c.to_ascii_uppercase());
                self.filter();
            }
            (Mode::Hint, KeyEvent::Character(_)) => {}
        }
        KeyDisposition::Consumed
    }

    /// Closes any session and returns to idle. Safe to call when already idle.
    pub fn deactivate(&mut self) {
        if self.modal_held {
            self.renderer.release_modal();
            self.modal_held = false;
        }
        if self.state.mode == Mode::Scroll {
            self.renderer.show_scroll_indicator(false);
        }
        self.renderer.hide();
        self.state = SessionState::default();
    }

    /// Waits for every dispatched command to finish.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "Dispatched command task did not complete");
            }
        }
    }

    fn take_modal(&mut self) -> bool {
        if !self.modal_held {
            self.modal_held = self.renderer.grab_modal();
        }
        self.modal_held
    }

    fn scroll(&mut self, direction: Direction) {
        debug!(%direction, "Scrolling");
        self.dispatch(Request::scroll(direction));
    }

    /// Runs after every change to the input buffer.
    ///
    /// A label equal to the buffer is selected once no other label still
    /// extends it. Otherwise labels not starting with the buffer are hidden;
    /// a buffer matching nothing hides everything and is kept as typed.
    fn filter(&mut self) {
        let buffer = self.state.input_buffer.as_str();
        let exact = self.state.labels.iter().find(|l| l.text == buffer);
        let extended = self
            .state
            .labels
            .iter()
            .any(|l| l.text.len() > buffer.len() && l.text.starts_with(buffer));

        if let (Some(label), false) = (exact, extended) {
            let element_id = label.element_id.clone();
            info!(label = %label.text, element = %element_id, "Hint selected");
            self.dispatch(Request::click(element_id));
            self.deactivate();
            return;
        }

        for label in &mut self.state.labels {
            label.visible = label.text.starts_with(buffer);
        }
        if !self.state.labels.iter().any(|l| l.visible) {
            debug!(buffer = %buffer, "No label matches input");
        }
        self.renderer.show_labels(&self.state.labels);
    }

    fn dispatch(&mut self, request: Request) {
        while let Some(joined) = self.in_flight.try_join_next() {
            if let Err(err) = joined {
                warn!(error = %err, "Dispatched command task did not complete");
            }
        }

        let client = Arc::clone(&self.client);
        self.in_flight.spawn(async move {
            let command = request.command;
            match client
                .send(request)
                .await
                .map(|response| response.into_result_for(command))
            {
                Ok(Ok(_)) => debug!(%command, "Command acknowledged"),
                Ok(Err(rejected)) => warn!(%command, error = %rejected, "Backend rejected command"),
                Err(err) => error!(%command, error = %err, "Command failed"),
            }
        });
    }
}

impl<C, R> Drop for SelectionStateMachine<C, R> {
    fn drop(&mut self) {
        if !self.in_flight.is_empty() {
            debug!(
                pending = self.in_flight.len(),
                "Dropping selection state machine with commands in flight"
            );
        }
    }
}
