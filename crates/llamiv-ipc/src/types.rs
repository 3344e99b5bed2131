use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::ApplicationError;

/// Commands understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Scan,
    Scroll,
    Click,
    Ping,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Scan => "SCAN",
            Command::Scroll => "SCROLL",
            Command::Click => "CLICK",
            Command::Ping => "PING",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SCAN" => Ok(Command::Scan),
            "SCROLL" => Ok(Command::Scroll),
            "CLICK" => Ok(Command::Click),
            "PING" => Ok(Command::Ping),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

/// Scroll direction carried by `SCROLL` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Maps the vi movement keys (`h`, `j`, `k`, `l`) to a direction, ignoring case.
    pub fn from_vi_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'h' => Some(Direction::Left),
            'j' => Some(Direction::Down),
            'k' => Some(Direction::Up),
            'l' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Opaque element identifier chosen by the backend (string or number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Value);

impl ElementId {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(Value::String(value))
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(Value::from(value))
    }
}

/// One request frame: `{"command": "...", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    pub fn new(command: Command, params: Map<String, Value>) -> Self {
        Self { command, params }
    }

    pub fn scan() -> Self {
        Self::new(Command::Scan, Map::new())
    }

    pub fn ping() -> Self {
        Self::new(Command::Ping, Map::new())
    }

    pub fn scroll(direction: Direction) -> Self {
        let mut params = Map::new();
        params.insert("direction".to_string(), Value::from(direction.as_str()));
        Self::new(Command::Scroll, params)
    }

    pub fn click(id: ElementId) -> Self {
        let mut params = Map::new();
        params.insert("id".to_string(), id.into_value());
        Self::new(Command::Click, params)
    }
}

/// Outcome reported by the backend in every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    /// Reply to `PING`.
    Pong,
    #[serde(other)]
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Pong => "pong",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element reported by `SCAN`. Only `id`, `x` and `y` are relied upon;
/// anything else the backend sends is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w: None,
            h: None,
            name: None,
            role: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One response frame. The shape beyond `status` depends on the command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Response {
    pub fn success() -> Self {
        Self::with_status(Status::Success)
    }

    pub fn pong() -> Self {
        Self::with_status(Status::Pong)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_status(Status::Error)
        }
    }

    pub fn scanned(elements: Vec<Element>) -> Self {
        Self {
            elements: Some(elements),
            ..Self::success()
        }
    }

    fn with_status(status: Status) -> Self {
        Self {
            status,
            elements: None,
            message: None,
            extra: Map::new(),
        }
    }

    /// Whether this is an acceptable answer to `command`. `pong` only
    /// answers `PING`; every other command needs `success`.
    pub fn is_success_for(&self, command: Command) -> bool {
        match self.status {
            Status::Success => true,
            Status::Pong => command == Command::Ping,
            Status::Error | Status::Unknown => false,
        }
    }

    /// Turns any status that does not answer `command` into an
    /// [`ApplicationError`].
    pub fn into_result_for(self, command: Command) -> Result<Self, ApplicationError> {
        if self.is_success_for(command) {
            Ok(self)
        } else {
            Err(ApplicationError {
                status: self.status,
                message: self.message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Command::Scan).unwrap(), json!("SCAN"));
        assert_eq!(
            serde_json::to_value(Command::Scroll).unwrap(),
            json!("SCROLL")
        );
        assert_eq!("click".parse::<Command>().unwrap(), Command::Click);
        assert!("jump".parse::<Command>().is_err());
    }

    #[test]
    fn test_direction_from_vi_keys() {
        assert_eq!(Direction::from_vi_key('h'), Some(Direction::Left));
        assert_eq!(Direction::from_vi_key('J'), Some(Direction::Down));
        assert_eq!(Direction::from_vi_key('k'), Some(Direction::Up));
        assert_eq!(Direction::from_vi_key('L'), Some(Direction::Right));
        assert_eq!(Direction::from_vi_key('x'), None);
    }

    #[test]
    fn test_scroll_request_shape() {
        let request = Request::scroll(Direction::Down);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"command": "SCROLL", "params": {"direction": "down"}})
        );
    }

    #[test]
    fn test_click_request_keeps_opaque_id() {
        let numeric = Request::click(ElementId::from(42u64));
        assert_eq!(numeric.params["id"], json!(42));

        let text = Request::click(ElementId::from("8731"));
        assert_eq!(text.params["id"], json!("8731"));
    }

    #[test]
    fn test_scan_response_deserializes_elements() {
        let raw = json!({
            "status": "success",
            "elements": [
                {"id": "100", "x": 10, "y": 20, "w": 30, "h": 40, "name": "OK", "role": "push button"},
                {"id": 7, "x": 1.5, "y": 2.5, "depth": 3}
            ]
        });
        let response: Response = serde_json::from_value(raw).unwrap();
        assert_eq!(response.status, Status::Success);

        let elements = response.elements.unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].id.to_string(), "100");
        assert_eq!(elements[0].name.as_deref(), Some("OK"));
        assert_eq!(elements[1].id, ElementId::from(7u64));
        assert_eq!(elements[1].extra["depth"], json!(3));
    }

    #[test]
    fn test_error_response_becomes_application_error() {
        let response: Response =
            serde_json::from_value(json!({"status": "error", "message": "Element not found"}))
                .unwrap();
        let err = response.into_result_for(Command::Click).unwrap_err();
        assert_eq!(err.status, Status::Error);
        assert_eq!(err.message.as_deref(), Some("Element not found"));
    }

    #[test]
    fn test_unknown_status_is_not_success() {
        let response: Response = serde_json::from_value(json!({"status": "busy"})).unwrap();
        assert_eq!(response.status, Status::Unknown);
        assert!(response.into_result_for(Command::Scan).is_err());
    }

    #[test]
    fn test_pong_only_answers_ping() {
        let response: Response = serde_json::from_value(json!({"status": "pong"})).unwrap();
        assert!(response.is_success_for(Command::Ping));
        for command in [Command::Scan, Command::Click, Command::Scroll] {
            assert!(!response.is_success_for(command), "{command} accepted pong");
        }

        let err = response.into_result_for(Command::Scan).unwrap_err();
        assert_eq!(err.status, Status::Pong);
    }

    #[test]
    fn test_success_answers_every_command() {
        for command in [Command::Ping, Command::Scan, Command::Click, Command::Scroll] {
            assert!(Response::success().is_success_for(command));
        }
    }
}
