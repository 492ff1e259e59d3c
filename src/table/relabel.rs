use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::model::{ClassLabel, Detection};

static QUANTITY_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(Cant\.?|Cantidad)\b").expect("valid pattern"));
static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid pattern"));
static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\d+(\.\d+)?$").expect("valid pattern"));

/// Label implied by a detection's text, if any.
///
/// A quantity header word or a bare number means `cantidad`, a dollar amount
/// means `precio_unitario`. Bare numbers inside a price box keep their label.
pub fn label_from_text(det: &Detection) -> Option<ClassLabel> {
    let text = det.text.trim();
    let mut label = None;

    if QUANTITY_WORD.is_match(text) {
        label = Some(ClassLabel::new("cantidad"));
    }
    if PLAIN_NUMBER.is_match(text) && !det.label.contains("precio") {
        label = Some(ClassLabel::new("cantidad"));
    }
    if DOLLAR_AMOUNT.is_match(text) {
        label = Some(ClassLabel::new("precio_unitario"));
    }
    label
}

pub fn relabel_from_text(detections: &mut [Detection]) {
    for det in detections.iter_mut() {
        if let Some(label) = label_from_text(det) {
            if label != det.label {
                debug!(from = %det.label, to = %label, text = %det.text, "relabel detection");
                det.label = label;
            }
        }
    }
}
