//! The top-level object a host integration owns.
//!
//! [`LlamivContext`] ties together the backend supervisor, the transport
//! client and the selection state machine. The host calls [`init`] once,
//! forwards activations and keys (directly or through [`run`]), and calls
//! [`shutdown`] before exiting.
//!
//! [`init`]: LlamivContext::init
//! [`run`]: LlamivContext::run
//! [`shutdown`]: LlamivContext::shutdown

use std::sync::Arc;
use std::time::Duration;

use llamiv_core::Activation;
use llamiv_core::ActivationError;
use llamiv_core::KeyDisposition;
use llamiv_core::KeyEvent;
use llamiv_core::Mode;
use llamiv_core::OverlayRenderer;
use llamiv_core::SelectionStateMachine;
use llamiv_ipc::IpcClient;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::supervisor::ServiceStatus;
use crate::supervisor::ServiceSupervisor;

/// How long shutdown waits for dispatched commands before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Input from the host: keybinding activations and keys captured while modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    ActivateHint,
    ActivateScroll,
    Key(KeyEvent),
    Shutdown,
}

pub struct LlamivContext<C, R> {
    supervisor: Box<dyn ServiceSupervisor>,
    client: Arc<C>,
    machine: SelectionStateMachine<C, R>,
    shut_down: bool,
}

impl<C, R> LlamivContext<C, R>
where
    C: IpcClient + 'static,
    R: OverlayRenderer,
{
    pub fn new(client: Arc<C>, renderer: R, supervisor: Box<dyn ServiceSupervisor>) -> Self {
        let machine = SelectionStateMachine::new(Arc::clone(&client), renderer);
        Self {
            supervisor,
            client,
            machine,
            shut_down: false,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn machine(&self) -> &SelectionStateMachine<C, R> {
        &self.machine
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn supervisor_status(&mut self) -> ServiceStatus {
        self.supervisor.status()
    }

    /// Starts the backend. A backend that cannot be started is logged and
    /// otherwise ignored; activations will then fail with connect errors.
    pub fn init(&mut self) -> ServiceStatus {
        self.shut_down = false;
        if let Err(err) = self.supervisor.start() {
            warn!(error = %err, "Backend not started; continuing without it");
        }
        let status = self.supervisor.status();
        info!(?status, "llamiv initialised");
        status
    }

    /// Closes any session, waits briefly for in-flight commands and stops
    /// the backend. Calling it twice is harmless.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        self.machine.deactivate();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.machine.settle())
            .await
            .is_err()
        {
            warn!(
                pending = self.machine.in_flight(),
                "Abandoning commands still in flight at shutdown"
            );
        }

        if let Err(err) = self.supervisor.stop() {
            warn!(error = %err, "Failed to stop backend");
        }
        info!("llamiv shut down");
    }

    pub async fn activate_hint(&mut self) -> Result<Activation, ActivationError> {
        self.machine.activate_hint().await
    }

    pub fn activate_scroll(&mut self) -> Result<Activation, ActivationError> {
        self.machine.activate_scroll()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyDisposition {
        self.machine.handle_key(key)
    }

    /// Waits for dispatched `CLICK`/`SCROLL` commands to finish.
    pub async fn settle(&mut self) {
        self.machine.settle().await;
    }

    /// Processes events until [`OverlayEvent::Shutdown`] arrives or every
    /// sender is dropped, then shuts down.
    pub async fn run(&mut self, mut events: mpsc::Receiver<OverlayEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                OverlayEvent::ActivateHint => {
                    if let Err(err) = self.activate_hint().await {
                        debug!(error = %err, retryable = err.is_retryable(), "Hint activation dropped");
                    }
                }
                OverlayEvent::ActivateScroll => {
                    if let Err(err) = self.activate_scroll() {
                        debug!(error = %err, "Scroll activation dropped");
                    }
                }
                OverlayEvent::Key(key) => {
                    self.handle_key(key);
                }
                OverlayEvent::Shutdown => break,
            }
        }
        self.shutdown().await;
    }
}
