use std::sync::Arc;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use llamiv_common::color_init;
use llamiv_common::TelemetryConfig;
use llamiv_common::init_tracing;
use llamiv_ipc::ClientConfig;
use llamiv_ipc::UnixSocketClient;
use tracing::debug;

use crate::commands::Cli;
use crate::commands::Commands;
use crate::commands::OutputFormat;
use crate::context::LlamivContext;
use crate::error::CliError;
use crate::error::exit_codes;
use crate::handlers;
use crate::handlers::HandlerContext;
use crate::presenter::create_presenter;
use crate::renderer::ConsoleRenderer;
use crate::supervisor::CommandSupervisor;
use crate::supervisor::ExternalSupervisor;
use crate::supervisor::ServiceSupervisor;
use crate::supervisor::SupervisorConfig;

const PROGRAM_NAME: &str = "llamiv";

pub struct Application;

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self
    }

    /// Parses arguments, runs the command and returns the process exit code.
    pub fn run(&self) -> i32 {
        let cli = Cli::parse();
        let _telemetry = init_tracing(
            &TelemetryConfig::new(cli.verbose).with_log_file(cli.log_file.clone()),
        );
        color_init(cli.no_color);
        let format = cli.effective_format();
        debug!(command = ?cli.command, format = ?format, "CLI command parsed");

        match self.execute(cli) {
            Ok(()) => exit_codes::SUCCESS,
            Err(e) => self.handle_error(&e, format),
        }
    }

    fn execute(&self, cli: Cli) -> Result<(), CliError> {
        let config = client_config(&cli);

        match &cli.command {
            Commands::Completions { shell } => {
                let mut cmd = Cli::command();
                generate(*shell, &mut cmd, PROGRAM_NAME, &mut std::io::stdout());
                return Ok(());
            }
            Commands::Socket => {
                create_presenter(&cli.effective_format())
                    .present_kv("socket", &config.socket_path.display().to_string());
                return Ok(());
            }
            _ => {}
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)?;
        runtime.block_on(self.execute_with_backend(cli, config))
    }

    async fn execute_with_backend(&self, cli: Cli, config: ClientConfig) -> Result<(), CliError> {
        let supervisor: Box<dyn ServiceSupervisor> = if cli.spawn_backend {
            Box::new(CommandSupervisor::new(SupervisorConfig::from_env()?))
        } else {
            Box::new(ExternalSupervisor)
        };
        let timeout = config.timeout;
        let client = Arc::new(UnixSocketClient::new(config));
        let mut llamiv = LlamivContext::new(client, ConsoleRenderer::new(), supervisor);

        llamiv.init();
        let result = if cli.spawn_backend {
            handlers::wait_for_backend(llamiv.client(), timeout).await
        } else {
            Ok(())
        };
        let result = match result {
            Ok(()) => {
                let mut ctx = HandlerContext::new(&mut llamiv, cli.effective_format());
                self.dispatch_command(&mut ctx, cli.command).await
            }
            Err(e) => Err(e),
        };
        llamiv.shutdown().await;
        result
    }

    async fn dispatch_command(
        &self,
        ctx: &mut HandlerContext<'_, UnixSocketClient>,
        command: Commands,
    ) -> Result<(), CliError> {
        match command {
            Commands::Completions { .. } | Commands::Socket => {
                unreachable!("Handled before connecting")
            }
            Commands::Ping => handlers::handle_ping(ctx).await,
            Commands::Scan => handlers::handle_scan(ctx).await,
            Commands::Click { id } => handlers::handle_click(ctx, id).await,
            Commands::Scroll { direction } => handlers::handle_scroll(ctx, direction).await,
            Commands::Hint { keys } => handlers::handle_hint(ctx, keys).await,
            Commands::ScrollMode { keys } => handlers::handle_scroll_mode(ctx, keys).await,
        }
    }

    fn handle_error(&self, e: &CliError, format: OutputFormat) -> i32 {
        let presenter = create_presenter(&format);
        match e.transport() {
            Some(transport) => presenter.present_transport_error(transport),
            None => presenter.present_error(&e.to_string()),
        }
        e.exit_code()
    }
}

/// Environment configuration with command-line overrides applied.
fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(socket) = &cli.socket {
        config = config.with_socket_path(socket);
    }
    if let Some(ms) = cli.timeout_ms {
        config = config.with_timeout(std::time::Duration::from_millis(ms));
    }
    if let Some(envelope) = cli.envelope {
        config = config.with_envelope(envelope);
    }
    config
}
