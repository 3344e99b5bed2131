//! Starting and stopping the backend service process.
//!
//! The backend may not be listening yet when the overlay is first used; the
//! transport reports that as an ordinary connect failure, so nothing here
//! waits for the socket to appear.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;

use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

const DEFAULT_SERVICE_CMD: &str = "llamiv-service";

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Invalid service command: {0}")]
    InvalidCommand(String),

    #[error("Failed to spawn backend '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to signal backend (pid {pid}): {source}")]
    Signal {
        pid: u32,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    NotStarted,
    Running { pid: u32 },
    Exited { code: Option<i32> },
}

/// Owns the lifecycle of the backend process.
pub trait ServiceSupervisor: Send {
    fn start(&mut self) -> Result<(), SupervisorError>;

    fn stop(&mut self) -> Result<(), SupervisorError>;

    fn status(&mut self) -> ServiceStatus;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Backend stderr is appended here when set.
    pub log_path: Option<PathBuf>,
}

impl SupervisorConfig {
    /// Reads `LLAMIV_SERVICE_CMD` (shell syntax) and `LLAMIV_SERVICE_LOG`.
    pub fn from_env() -> Result<Self, SupervisorError> {
        let command =
            env::var("LLAMIV_SERVICE_CMD").unwrap_or_else(|_| DEFAULT_SERVICE_CMD.to_string());
        let log_path = env::var("LLAMIV_SERVICE_LOG").ok().map(PathBuf::from);
        Self::parse(&command).map(|config| config.with_log_path(log_path))
    }

    pub fn parse(command: &str) -> Result<Self, SupervisorError> {
        let mut words = shell_words::split(command)
            .map_err(|e| SupervisorError::InvalidCommand(e.to_string()))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| SupervisorError::InvalidCommand("command is empty".to_string()))?;
        Ok(Self {
            program,
            args: words.collect(),
            log_path: None,
        })
    }

    pub fn with_log_path(mut self, log_path: Option<PathBuf>) -> Self {
        self.log_path = log_path;
        self
    }
}

/// Spawns the backend as a child process and terminates it with SIGTERM.
pub struct CommandSupervisor {
    config: SupervisorConfig,
    child: Option<Child>,
}

impl CommandSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    fn stderr(&self) -> Stdio {
        let Some(path) = &self.config.log_path else {
            return Stdio::null();
        };
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Stdio::from(file),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cannot open backend log; discarding output");
                Stdio::null()
            }
        }
    }
}

impl ServiceSupervisor for CommandSupervisor {
    fn start(&mut self) -> Result<(), SupervisorError> {
        if let ServiceStatus::Running { pid } = self.status() {
            debug!(pid, "Backend already running");
            return Ok(());
        }

        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(self.stderr())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        info!(pid = child.id(), program = %self.config.program, "Backend started");
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SupervisorError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let pid = child.id();

        if let Ok(Some(status)) = child.try_wait() {
            debug!(pid, ?status, "Backend had already exited");
            return Ok(());
        }

        terminate(pid)?;
        // Reap in the background so the child never lingers as a zombie.
        std::thread::spawn(move || match child.wait() {
            Ok(status) => info!(pid, ?status, "Backend exited"),
            Err(err) => warn!(pid, error = %err, "Failed to reap backend"),
        });
        Ok(())
    }

    fn status(&mut self) -> ServiceStatus {
        let Some(child) = self.child.as_mut() else {
            return ServiceStatus::NotStarted;
        };
        match child.try_wait() {
            Ok(None) => ServiceStatus::Running { pid: child.id() },
            Ok(Some(status)) => ServiceStatus::Exited {
                code: status.code(),
            },
            Err(err) => {
                warn!(error = %err, "Cannot query backend status");
                ServiceStatus::Exited { code: None }
            }
        }
    }
}

impl Drop for CommandSupervisor {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "Failed to stop backend on drop");
        }
    }
}

/// For backends started by something else (systemd, a desktop session).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalSupervisor;

impl ServiceSupervisor for ExternalSupervisor {
    fn start(&mut self) -> Result<(), SupervisorError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SupervisorError> {
        Ok(())
    }

    fn status(&mut self) -> ServiceStatus {
        ServiceStatus::NotStarted
    }
}

fn terminate(pid: u32) -> Result<(), SupervisorError> {
    let pid_t: libc::pid_t = pid.try_into().map_err(|_| SupervisorError::Signal {
        pid,
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "PID out of range"),
    })?;

    let result = unsafe { libc::kill(pid_t, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(SupervisorError::Signal {
            pid,
            source: std::io::Error::last_os_error(),
        })
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Records lifecycle calls; optionally fails to start.
    #[derive(Debug, Default)]
    pub struct MockSupervisor {
        pub starts: usize,
        pub stops: usize,
        pub fail_start: bool,
        running: bool,
    }

    impl MockSupervisor {
        pub fn failing() -> Self {
            Self {
                fail_start: true,
                ..Self::default()
            }
        }
    }

    impl ServiceSupervisor for MockSupervisor {
        fn start(&mut self) -> Result<(), SupervisorError> {
            self.starts += 1;
            if self.fail_start {
                return Err(SupervisorError::Spawn {
                    program: "mock".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            self.running = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), SupervisorError> {
            self.stops += 1;
            self.running = false;
            Ok(())
        }

        fn status(&mut self) -> ServiceStatus {
            if self.running {
                ServiceStatus::Running { pid: 4242 }
            } else {
                ServiceStatus::NotStarted
            }
        }
    }
}
