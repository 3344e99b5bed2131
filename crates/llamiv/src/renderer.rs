//! Headless overlay renderer used by the CLI.
//!
//! Instead of drawing, it keeps a transcript of what it was asked to show,
//! which the CLI prints once the session ends.

use llamiv_core::HintLabel;
use llamiv_core::OverlayRenderer;
use serde::Serialize;
use tracing::debug;

/// One draw call received from the state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    ModalGrabbed,
    ModalRefused,
    ModalReleased,
    Labels { visible: Vec<LabelView> },
    ScrollIndicator { visible: bool },
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelView {
    pub text: String,
    pub element: String,
    pub x: f64,
    pub y: f64,
}

impl From<&HintLabel> for LabelView {
    fn from(label: &HintLabel) -> Self {
        Self {
            text: label.text.clone(),
            element: label.element_id.to_string(),
            x: label.x,
            y: label.y,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    events: Vec<RenderEvent>,
    refuse_modal: bool,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose modal grab always fails.
    pub fn refusing_modal() -> Self {
        Self {
            refuse_modal: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[RenderEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    /// The most recent label set that was drawn, if any.
    pub fn last_labels(&self) -> Option<&[LabelView]> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::Labels { visible } => Some(visible.as_slice()),
            _ => None,
        })
    }

    fn record(&mut self, event: RenderEvent) {
        debug!(?event, "Overlay draw");
        self.events.push(event);
    }
}

impl OverlayRenderer for ConsoleRenderer {
    fn grab_modal(&mut self) -> bool {
        if self.refuse_modal {
            self.record(RenderEvent::ModalRefused);
            return false;
        }
        self.record(RenderEvent::ModalGrabbed);
        true
    }

    fn release_modal(&mut self) {
        self.record(RenderEvent::ModalReleased);
    }

    fn show_labels(&mut self, labels: &[HintLabel]) {
        let visible = labels
            .iter()
            .filter(|label| label.visible)
            .map(LabelView::from)
            .collect();
        self.record(RenderEvent::Labels { visible });
    }

    fn show_scroll_indicator(&mut self, visible: bool) {
        self.record(RenderEvent::ScrollIndicator { visible });
    }

    fn hide(&mut self) {
        self.record(RenderEvent::Hidden);
    }
}
