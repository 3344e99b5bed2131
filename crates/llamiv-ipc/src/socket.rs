use std::path::Path;
use std::path::PathBuf;

/// Overrides the socket location entirely.
pub(crate) const SOCKET_ENV: &str = "LLAMIV_SOCKET";

const SOCKET_FILE_NAME: &str = "llamiv.sock";

const FALLBACK_DIR: &str = "/tmp";

/// Picks the socket location from `$LLAMIV_SOCKET`, then
/// `$XDG_RUNTIME_DIR/llamiv.sock`, then `/tmp/llamiv.sock`.
pub(crate) fn resolve_socket_path(custom: Option<&str>, runtime_dir: Option<&str>) -> PathBuf {
    if let Some(custom) = custom.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(custom);
    }

    runtime_dir
        .filter(|dir| !dir.trim().is_empty())
        .map(|dir| Path::new(dir).join(SOCKET_FILE_NAME))
        .unwrap_or_else(|| Path::new(FALLBACK_DIR).join(SOCKET_FILE_NAME))
}
