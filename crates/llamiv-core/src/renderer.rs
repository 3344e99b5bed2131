use crate::hints::HintLabel;

/// Draws the overlay and owns keyboard focus on behalf of the state machine.
///
/// The renderer keeps no state of its own beyond what it is told to draw;
/// it forwards raw key events back as [`KeyEvent`](crate::KeyEvent)s.
pub trait OverlayRenderer: Send {
    /// Take exclusive keyboard focus. Returns `false` if the desktop refused.
    fn grab_modal(&mut self) -> bool;

    /// Give keyboard focus back to the underlying application.
    fn release_modal(&mut self);

    /// Redraw every label at its position, honouring `visible`.
    fn show_labels(&mut self, labels: &[HintLabel]);

    /// Show or hide the scroll-mode banner.
    fn show_scroll_indicator(&mut self, visible: bool);

    /// Remove everything from the screen.
    fn hide(&mut self);
}
