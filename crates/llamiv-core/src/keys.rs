//! Platform-independent key events.
//!
//! The overlay's input adapter turns raw platform key codes into
//! [`KeyEvent`]s before they reach the state machine.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Escape,
    Backspace,
    Character(char),
}

/// Names accepted for [`KeyEvent::Escape`] (case-insensitive).
pub const ESCAPE_NAMES: &[&str] = &["escape", "esc"];

/// Names accepted for [`KeyEvent::Backspace`] (case-insensitive).
pub const BACKSPACE_NAMES: &[&str] = &["backspace", "bs"];

impl KeyEvent {
    /// Parses a single key name such as `Escape`, `BackSpace` or `j`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if ESCAPE_NAMES.contains(&lower.as_str()) {
            return Some(KeyEvent::Escape);
        }
        if BACKSPACE_NAMES.contains(&lower.as_str()) {
            return Some(KeyEvent::Backspace);
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeyEvent::Character(c)),
            _ => None,
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyEvent::Escape => f.write_str("Escape"),
            KeyEvent::Backspace => f.write_str("Backspace"),
            KeyEvent::Character(c) => write!(f, "{c}"),
        }
    }
}

/// Parses a whitespace-separated key script.
///
/// Tokens naming a special key become that key; any other token is typed
/// one character at a time, so `"ab backspace c esc"` yields
/// `a, b, Backspace, c, Escape`.
///
/// ```
/// use llamiv_core::keys::{KeyEvent, parse_key_sequence};
///
/// assert_eq!(
///     parse_key_sequence("jk Esc"),
///     vec![KeyEvent::Character('j'), KeyEvent::Character('k'), KeyEvent::Escape]
/// );
/// ```
pub fn parse_key_sequence(script: &str) -> Vec<KeyEvent> {
    script
        .split_whitespace()
        .flat_map(|token| match KeyEvent::from_name(token) {
            Some(key @ (KeyEvent::Escape | KeyEvent::Backspace)) => vec![key],
            _ => token.chars().map(KeyEvent::Character).collect(),
        })
        .collect()
}
