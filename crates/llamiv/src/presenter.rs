use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use llamiv_common::Colors;
use llamiv_ipc::Element;
use llamiv_ipc::TransportError;

use crate::commands::OutputFormat;
use crate::renderer::RenderEvent;

/// Output formatting for the CLI, so handlers never branch on the format.
pub trait Presenter {
    /// Present a success result with optional warning.
    fn present_success(&self, message: &str, warning: Option<&str>);

    fn present_error(&self, message: &str);

    /// Present a transport failure with its suggestion and retry hint.
    fn present_transport_error(&self, error: &TransportError);

    /// Present a structured value (for JSON output, shows the raw value).
    fn present_value(&self, value: &Value);

    /// Present scanned elements together with the labels they would get.
    fn present_elements(&self, elements: &[ElementView]);

    /// Present what the overlay drew during a session.
    fn present_session(&self, summary: &SessionSummary);

    fn present_kv(&self, key: &str, value: &str);

    fn present_info(&self, message: &str);
}

/// One scanned element, flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementView {
    pub label: String,
    pub id: Value,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ElementView {
    pub fn new(label: String, element: &Element) -> Self {
        Self {
            label,
            id: element.id.as_value().clone(),
            x: element.x,
            y: element.y,
            name: element.name.clone(),
            role: element.role.clone(),
        }
    }
}

/// Outcome of a scripted hint or scroll session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: &'static str,
    pub keys: Vec<String>,
    pub final_mode: String,
    pub input_buffer: String,
    pub events: Vec<RenderEvent>,
}

/// Stable machine-readable name for each transport failure.
pub fn transport_error_kind(error: &TransportError) -> &'static str {
    match error {
        TransportError::ConnectFailed { .. } => "connect_failed",
        TransportError::WriteFailed(_) => "write_failed",
        TransportError::ReadFailed(_) => "read_failed",
        TransportError::ConnectionClosedEarly => "connection_closed_early",
        TransportError::Timeout { .. } => "timeout",
        TransportError::ResponseTooLarge { .. } => "response_too_large",
        TransportError::Protocol(_) => "malformed_payload",
    }
}

/// Text presenter for human-readable output.
pub struct TextPresenter;

impl Presenter for TextPresenter {
    fn present_success(&self, message: &str, warning: Option<&str>) {
        println!("{} {}", Colors::success("✓"), message);
        if let Some(w) = warning {
            eprintln!("{} {}", Colors::dim("Warning:"), w);
        }
    }

    fn present_error(&self, message: &str) {
        eprintln!("{} {}", Colors::error("Error:"), message);
    }

    fn present_transport_error(&self, error: &TransportError) {
        eprintln!("{} {}", Colors::error("Error:"), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{} {}", Colors::dim("Suggestion:"), suggestion);
        }
        if error.is_retryable() {
            eprintln!(
                "{}",
                Colors::dim("(This error may be transient - retry may succeed)")
            );
        }
    }

    fn present_value(&self, value: &Value) {
        if let Some(s) = value.as_str() {
            println!("{}", s);
        } else {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            );
        }
    }

    fn present_elements(&self, elements: &[ElementView]) {
        if elements.is_empty() {
            println!("{}", Colors::dim("No elements found"));
            return;
        }
        println!("{}", Colors::bold(&format!("{} elements:", elements.len())));
        for element in elements {
            let id = match &element.id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let mut line = format!(
                "  {:>2}  {}  ({:.0}, {:.0})",
                Colors::bold(&element.label),
                id,
                element.x,
                element.y
            );
            if let Some(role) = &element.role {
                line.push_str(&format!(" {}", Colors::dim(role)));
            }
            if let Some(name) = &element.name {
                line.push_str(&format!(" \"{}\"", name));
            }
            println!("{}", line);
        }
    }

    fn present_session(&self, summary: &SessionSummary) {
        println!(
            "{} {} session, keys: {}",
            Colors::bold("▶"),
            summary.mode,
            if summary.keys.is_empty() {
                "(none)".to_string()
            } else {
                summary.keys.join(" ")
            }
        );
        for event in &summary.events {
            let line = match event {
                RenderEvent::ModalGrabbed => "grabbed keyboard".to_string(),
                RenderEvent::ModalRefused => "keyboard grab refused".to_string(),
                RenderEvent::ModalReleased => "released keyboard".to_string(),
                RenderEvent::Labels { visible } if visible.is_empty() => {
                    "labels: (none visible)".to_string()
                }
                RenderEvent::Labels { visible } => {
                    let texts: Vec<&str> = visible.iter().map(|l| l.text.as_str()).collect();
                    format!("labels: {}", texts.join(" "))
                }
                RenderEvent::ScrollIndicator { visible: true } => "scroll indicator on".to_string(),
                RenderEvent::ScrollIndicator { visible: false } => {
                    "scroll indicator off".to_string()
                }
                RenderEvent::Hidden => "overlay hidden".to_string(),
            };
            println!("  {}", line);
        }
        println!("  {}: {}", Colors::dim("final mode"), summary.final_mode);
        if !summary.input_buffer.is_empty() {
            println!("  {}: {}", Colors::dim("input"), summary.input_buffer);
        }
    }

    fn present_kv(&self, key: &str, value: &str) {
        println!("{}: {}", key, value);
    }

    fn present_info(&self, message: &str) {
        println!("{}", Colors::dim(message));
    }
}

/// JSON presenter for machine-readable output.
pub struct JsonPresenter;

impl JsonPresenter {
    fn print(value: &Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

impl Presenter for JsonPresenter {
    fn present_success(&self, message: &str, warning: Option<&str>) {
        let mut output = json!({
            "success": true,
            "message": message
        });
        if let Some(w) = warning {
            output["warning"] = json!(w);
        }
        Self::print(&output);
    }

    fn present_error(&self, message: &str) {
        let output = json!({
            "success": false,
            "error": message
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    }

    fn present_transport_error(&self, error: &TransportError) {
        let output = json!({
            "success": false,
            "error": error.to_string(),
            "kind": transport_error_kind(error),
            "retryable": error.is_retryable(),
            "suggestion": error.suggestion(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    }

    fn present_value(&self, value: &Value) {
        Self::print(value);
    }

    fn present_elements(&self, elements: &[ElementView]) {
        Self::print(&json!({ "elements": elements }));
    }

    fn present_session(&self, summary: &SessionSummary) {
        Self::print(&serde_json::to_value(summary).unwrap_or_default());
    }

    fn present_kv(&self, key: &str, value: &str) {
        Self::print(&json!({ key: value }));
    }

    fn present_info(&self, message: &str) {
        Self::print(&json!({ "info": message }));
    }
}

/// Create a presenter based on the output format.
pub fn create_presenter(format: &OutputFormat) -> Box<dyn Presenter> {
    match format {
        OutputFormat::Json => Box::new(JsonPresenter),
        OutputFormat::Text => Box::new(TextPresenter),
    }
}
