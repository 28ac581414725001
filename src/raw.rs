// Copyright 2026 Oxide Computer Company

//! Unclassified differences, for displaying the raw delta between two
//! revisions next to the classified changes.

use json_patch::Patch;
use serde_json::Value;
use similar::TextDiff;

/// The RFC 6902 patch that turns `old` into `new`.
pub fn raw_diff(old: &Value, new: &Value) -> Patch {
    json_patch::diff(old, new)
}

/// A unified line diff of the pretty-printed documents. Empty when the
/// documents print identically.
pub fn unified_text_diff(old: &Value, new: &Value) -> String {
    let old_text = format!("{old:#}\n");
    let new_text = format!("{new:#}\n");
    if old_text == new_text {
        return String::new();
    }

    TextDiff::from_lines(&old_text, &new_text)
        .unified_diff()
        .context_radius(3)
        .header("old", "new")
        .to_string()
}
