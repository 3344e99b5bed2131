//! Hint label generation.
//!
//! Element `i` (in the order the backend reported them) gets `label_for(i)`:
//! `A`..`Z` for the first 26, then `AA`..`ZZ`.

use llamiv_ipc::Element;
use llamiv_ipc::ElementId;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of indices that receive distinct labels (26 + 26 * 26).
pub const LABEL_CAPACITY: usize = 26 + 26 * 26;

/// Label for the element at `index`.
///
/// Indices at or beyond [`LABEL_CAPACITY`] wrap around and reuse two-letter
/// labels, so they collide with earlier ones.
pub fn label_for(index: usize) -> String {
    if index < 26 {
        return char::from(LETTERS[index]).to_string();
    }

    let first = (index / 26 - 1) % 26;
    let second = index % 26;
    [char::from(LETTERS[first]), char::from(LETTERS[second])]
        .iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HintLabel {
    pub text: String,
    pub element_id: ElementId,
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

/// Labels `elements` in order, all initially visible.
pub fn assign_labels(elements: &[Element]) -> Vec<HintLabel> {
    if elements.len() > LABEL_CAPACITY {
        tracing::warn!(
            count = elements.len(),
            capacity = LABEL_CAPACITY,
            "More elements than distinct labels; some labels will repeat"
        );
    }

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| HintLabel {
            text: label_for(index),
            element_id: element.id.clone(),
            x: element.x,
            y: element.y,
            visible: true,
        })
        .collect()
}
