use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Environment variable naming a file to append logs to instead of stderr.
pub const LOG_FILE_ENV: &str = "LLAMIV_LOG";

/// Crates whose verbosity `-v` raises. Everything else stays at `warn`.
const LLAMIV_TARGETS: [&str; 4] = ["llamiv", "llamiv_core", "llamiv_ipc", "llamiv_common"];

/// Where logs go and how chatty they are when `RUST_LOG` is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Number of `-v` flags: 0 is `warn`, 1 is `debug`, 2 or more is `trace`.
    pub verbosity: u8,
    /// Append to this file through a non-blocking writer instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    /// Filter directives used when `RUST_LOG` is unset.
    ///
    /// Verbosity only applies to the llamiv crates so that `-v` does not
    /// drown the session in tokio and mio events.
    pub fn default_directives(&self) -> String {
        let level = match self.verbosity {
            0 => return "warn".to_string(),
            1 => "debug",
            _ => "trace",
        };
        std::iter::once("warn".to_string())
            .chain(LLAMIV_TARGETS.iter().map(|target| format!("{target}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Keeps the non-blocking log writer alive. Drop it last.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    fn disabled() -> Self {
        Self { _guard: None }
    }

    pub fn is_file_backed(&self) -> bool {
        self._guard.is_some()
    }
}

pub fn init_tracing(config: &TelemetryConfig) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let (writer, guard) = match &config.log_file {
        Some(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            Err(err) => {
                eprintln!(
                    "Warning: failed to open log file {}: {}",
                    path.display(),
                    err
                );
                (BoxMakeWriter::new(std::io::stderr), None)
            }
        },
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    // Targets only once verbose.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.verbosity > 0)
        .with_ansi(guard.is_none() && std::io::stderr().is_terminal())
        .with_writer(writer);

    if subscriber.try_init().is_err() {
        return TelemetryGuard::disabled();
    }

    TelemetryGuard { _guard: guard }
}
