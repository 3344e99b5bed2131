use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::frame::Envelope;
use crate::frame::MAX_RESPONSE_BYTES;
use crate::socket::SOCKET_ENV;
use crate::socket::resolve_socket_path;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub socket_path: PathBuf,
    pub timeout: Duration,
    pub max_response_bytes: u32,
    pub envelope: Envelope,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            socket_path: resolve_socket_path(
                lookup(SOCKET_ENV).as_deref(),
                lookup("XDG_RUNTIME_DIR").as_deref(),
            ),
            timeout: Duration::from_millis(
                parse_or(&lookup, "LLAMIV_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            max_response_bytes: parse_or(&lookup, "LLAMIV_MAX_RESPONSE_BYTES")
                .unwrap_or(MAX_RESPONSE_BYTES),
            envelope: parse_or(&lookup, "LLAMIV_ENVELOPE").unwrap_or_default(),
        }
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, max: u32) -> Self {
        self.max_response_bytes = max;
        self
    }

    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = %key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}
