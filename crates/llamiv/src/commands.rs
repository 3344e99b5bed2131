use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
pub use clap_complete::Shell;
use llamiv_common::LOG_FILE_ENV;
use llamiv_ipc::Direction;
use llamiv_ipc::ElementId;
use llamiv_ipc::Envelope;

const LONG_ABOUT: &str = r#"llamiv drives on-screen elements from the keyboard.

The llamiv backend scans the accessibility tree and performs clicks and
scrolls; this tool talks to it over a Unix socket. Each element found by a
scan is tagged with a label (A..Z, then AA..ZZ). Typing a label clicks the
element. In scroll mode h/j/k/l scroll left/down/up/right.

SOCKET:
    $LLAMIV_SOCKET, else $XDG_RUNTIME_DIR/llamiv.sock, else /tmp/llamiv.sock

EXAMPLES:
    # Is the backend answering?
    llamiv ping

    # List clickable elements
    llamiv scan

    # Run a hint session: type "b", which clicks the element labelled B
    llamiv hint --keys b

    # Scroll down twice, then up, then leave scroll mode
    llamiv scroll-mode --keys "jjk Escape""#;

#[derive(Parser)]
#[command(name = "llamiv")]
#[command(author, version)]
#[command(about = "Keyboard hints and scrolling for on-screen elements")]
#[command(long_about = LONG_ABOUT)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log llamiv activity: -v for debug, -vv for trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, env = LOG_FILE_ENV, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Backend socket path (overrides $LLAMIV_SOCKET)
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    /// Per-request timeout in milliseconds (overrides $LLAMIV_TIMEOUT_MS)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Request envelope: nested or flat (overrides $LLAMIV_ENVELOPE)
    #[arg(long, global = true)]
    pub envelope: Option<Envelope>,

    /// Start the backend from $LLAMIV_SERVICE_CMD for the duration of the command
    #[arg(long, global = true)]
    pub spawn_backend: bool,
}

impl Cli {
    /// Returns the effective output format, considering --json shorthand.
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the backend is answering
    Ping,

    /// List the elements the backend can act on, with their labels
    Scan,

    /// Click an element by its backend id
    Click {
        /// Element id as reported by `scan` (numbers are sent as numbers)
        id: String,
    },

    /// Scroll the focused view once
    Scroll {
        #[arg(value_enum)]
        direction: ScrollDirection,
    },

    /// Run a hint session, feeding it the given keys
    #[command(long_about = r#"Run a hint session, feeding it the given keys.

KEYS is whitespace separated. "Escape"/"Esc" and "Backspace"/"BS" name
special keys; any other word is typed one character at a time.

EXAMPLES:
    llamiv hint --keys a
    llamiv hint --keys "a Backspace b"
    llamiv hint --keys "zz Esc""#)]
    Hint {
        #[arg(short, long, default_value = "")]
        keys: String,
    },

    /// Run a scroll-mode session, feeding it the given keys
    #[command(name = "scroll-mode")]
    ScrollMode {
        #[arg(short, long, default_value = "")]
        keys: String,
    },

    /// Print the socket path that would be used
    Socket,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl From<ScrollDirection> for Direction {
    fn from(direction: ScrollDirection) -> Self {
        match direction {
            ScrollDirection::Up => Direction::Up,
            ScrollDirection::Down => Direction::Down,
            ScrollDirection::Left => Direction::Left,
            ScrollDirection::Right => Direction::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Element ids typed on the command line: integers become JSON numbers,
/// anything else a string.
pub fn parse_element_id(raw: &str) -> ElementId {
    match raw.parse::<u64>() {
        Ok(n) => ElementId::from(n),
        Err(_) => ElementId::from(raw),
    }
}
