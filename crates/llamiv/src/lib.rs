//! Host-side glue for the llamiv overlay: backend supervision, the
//! [`LlamivContext`] that owns a session, and the `llamiv` CLI.

#![deny(clippy::all)]

pub mod app;
pub mod commands;
pub mod context;
pub mod error;
pub mod handlers;
pub mod presenter;
pub mod renderer;
pub mod supervisor;

pub use app::Application;
pub use context::LlamivContext;
pub use context::OverlayEvent;
pub use error::CliError;
pub use handlers::HandlerResult;
pub use renderer::ConsoleRenderer;
pub use renderer::RenderEvent;
pub use supervisor::CommandSupervisor;
pub use supervisor::ExternalSupervisor;
pub use supervisor::ServiceStatus;
pub use supervisor::ServiceSupervisor;
pub use supervisor::SupervisorConfig;
pub use supervisor::SupervisorError;
