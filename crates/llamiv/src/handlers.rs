use std::time::Duration;
use std::time::Instant;

use llamiv_core::KeyEvent;
use llamiv_core::Mode;
use llamiv_core::label_for;
use llamiv_core::parse_key_sequence;
use llamiv_ipc::Direction;
use llamiv_ipc::IpcClient;
use llamiv_ipc::Request;
use llamiv_ipc::Status;
use tracing::debug;

use crate::commands::OutputFormat;
use crate::commands::ScrollDirection;
use crate::commands::parse_element_id;
use crate::context::LlamivContext;
use crate::error::CliError;
use crate::presenter::ElementView;
use crate::presenter::Presenter;
use crate::presenter::SessionSummary;
use crate::presenter::create_presenter;
use crate::renderer::ConsoleRenderer;

pub type HandlerResult = Result<(), CliError>;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct HandlerContext<'a, C> {
    pub llamiv: &'a mut LlamivContext<C, ConsoleRenderer>,
    pub format: OutputFormat,
    presenter: Box<dyn Presenter>,
}

impl<'a, C> HandlerContext<'a, C>
where
    C: IpcClient + 'static,
{
    pub fn new(llamiv: &'a mut LlamivContext<C, ConsoleRenderer>, format: OutputFormat) -> Self {
        let presenter = create_presenter(&format);
        Self {
            llamiv,
            format,
            presenter,
        }
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    async fn send(&self, request: Request) -> Result<llamiv_ipc::Response, CliError> {
        let command = request.command;
        let response = self.llamiv.client().send(request).await?;
        Ok(response.into_result_for(command)?)
    }
}

pub async fn handle_ping<C: IpcClient + 'static>(ctx: &mut HandlerContext<'_, C>) -> HandlerResult {
    let started = Instant::now();
    let response = ctx.send(Request::ping()).await?;
    let elapsed_ms = started.elapsed().as_millis();

    match ctx.format {
        OutputFormat::Json => ctx.presenter().present_value(&serde_json::json!({
            "status": response.status,
            "elapsed_ms": elapsed_ms,
        })),
        OutputFormat::Text => {
            let warning = (response.status != Status::Pong)
                .then(|| format!("expected 'pong', got '{}'", response.status));
            ctx.presenter().present_success(
                &format!("Backend is alive ({elapsed_ms}ms)"),
                warning.as_deref(),
            );
        }
    }
    Ok(())
}

pub async fn handle_scan<C: IpcClient + 'static>(ctx: &mut HandlerContext<'_, C>) -> HandlerResult {
    let response = ctx.send(Request::scan()).await?;
    let elements = response.elements.unwrap_or_default();
    debug!(count = elements.len(), "Scan returned");

    let views: Vec<ElementView> = elements
        .iter()
        .enumerate()
        .map(|(index, element)| ElementView::new(label_for(index), element))
        .collect();
    ctx.presenter().present_elements(&views);
    Ok(())
}

pub async fn handle_click<C: IpcClient + 'static>(
    ctx: &mut HandlerContext<'_, C>,
    id: String,
) -> HandlerResult {
    let element_id = parse_element_id(&id);
    ctx.send(Request::click(element_id)).await?;
    ctx.presenter()
        .present_success(&format!("Clicked element {id}"), None);
    Ok(())
}

pub async fn handle_scroll<C: IpcClient + 'static>(
    ctx: &mut HandlerContext<'_, C>,
    direction: ScrollDirection,
) -> HandlerResult {
    let direction = Direction::from(direction);
    ctx.send(Request::scroll(direction)).await?;
    ctx.presenter()
        .present_success(&format!("Scrolled {direction}"), None);
    Ok(())
}

pub async fn handle_hint<C: IpcClient + 'static>(
    ctx: &mut HandlerContext<'_, C>,
    keys: String,
) -> HandlerResult {
    ctx.llamiv.activate_hint().await?;
    run_session(ctx, "hint", &keys).await
}

pub async fn handle_scroll_mode<C: IpcClient + 'static>(
    ctx: &mut HandlerContext<'_, C>,
    keys: String,
) -> HandlerResult {
    ctx.llamiv.activate_scroll()?;
    run_session(ctx, "scroll", &keys).await
}

/// Feeds `script` to the active session, waits for the commands it
/// dispatched and prints what the overlay drew.
async fn run_session<C: IpcClient + 'static>(
    ctx: &mut HandlerContext<'_, C>,
    mode: &'static str,
    script: &str,
) -> HandlerResult {
    let keys = parse_key_sequence(script);
    let mut fed = Vec::with_capacity(keys.len());

    for key in keys {
        if ctx.llamiv.mode() == Mode::Idle {
            debug!(%key, "Session closed; ignoring remaining keys");
            break;
        }
        ctx.llamiv.handle_key(key);
        fed.push(key);
    }
    ctx.llamiv.settle().await;

    let machine = ctx.llamiv.machine();
    let summary = SessionSummary {
        mode,
        keys: fed.iter().map(KeyEvent::to_string).collect(),
        final_mode: format!("{:?}", machine.mode()),
        input_buffer: machine.state().input_buffer().to_string(),
        events: machine.renderer().events().to_vec(),
    };
    ctx.presenter().present_session(&summary);
    Ok(())
}

/// Polls with `PING` until the backend answers or `timeout` passes.
pub async fn wait_for_backend<C: IpcClient + 'static>(
    client: &C,
    timeout: Duration,
) -> Result<(), CliError> {
    let started = Instant::now();
    loop {
        match client.send(Request::ping()).await {
            Ok(_) => {
                debug!(waited_ms = started.elapsed().as_millis() as u64, "Backend ready");
                return Ok(());
            }
            Err(err) if err.is_retryable() && started.elapsed() < timeout => {
                debug!(error = %err, "Backend not ready yet");
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
            Err(err) if err.is_retryable() => {
                return Err(CliError::BackendNotReady {
                    waited: started.elapsed(),
                });
            }
            Err(err) => return Err(err.into()),
        }
    }
}
