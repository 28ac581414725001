// Copyright 2026 Oxide Computer Company

//! Leaf comparison: the presence and equality rules every other comparator
//! builds on.

use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::{ChangeCategory, ChangeRecord, ChangeType, Severity, compare::Compare};

/// Look up `key` in `parent`, treating JSON `null` the same as absence.
///
/// Non-object parents have no keys. Empty strings, `0` and `false` are
/// present values.
pub(crate) fn present<'a>(parent: &'a Value, key: &str) -> Option<&'a Value> {
    parent.get(key).filter(|value| !value.is_null())
}

/// Like [`present`] for an optional parent.
pub(crate) fn member<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    parent.and_then(|parent| present(parent, key))
}

/// View a section as a map; anything that is not an object is empty.
pub(crate) fn as_map(value: Option<&Value>) -> &Map<String, Value> {
    static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);
    value.and_then(Value::as_object).unwrap_or(&*EMPTY)
}

/// View a section as a list; anything that is not an array is empty.
pub(crate) fn as_list(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Structural equality of two JSON values.
///
/// Object members are compared as sets of key/value pairs, so two objects
/// that differ only in member order are equal. Numbers compare by
/// representation: `1` and `1.0` differ.
pub(crate) fn json_equal(old: &Value, new: &Value) -> bool {
    old == new
}

/// Describes where a leaf lives and how a change to it is classified.
#[derive(Clone, Copy, Debug)]
pub struct Target<'a> {
    pub category: ChangeCategory,
    pub path: &'a str,
    pub field: Option<&'a str>,
    pub severity: Severity,
}

impl<'a> Target<'a> {
    pub fn new(category: ChangeCategory, path: &'a str, severity: Severity) -> Self {
        Self {
            category,
            path,
            field: None,
            severity,
        }
    }

    pub fn field(self, field: &'a str) -> Self {
        Self {
            field: Some(field),
            ..self
        }
    }

    pub(crate) fn record(&self, change_type: ChangeType, description: String) -> ChangeRecord {
        let record = ChangeRecord::new(
            change_type,
            self.category,
            self.path,
            self.severity,
            description,
        );
        record.with_field(self.field)
    }
}

/// Compare a single value between two documents.
///
/// Produces at most one record: `added` when the value appears, `removed`
/// when it disappears, and `modified` when both exist but differ. `label`
/// names the value in the record description.
pub fn compare_value(
    old: Option<&Value>,
    new: Option<&Value>,
    target: Target<'_>,
    label: &str,
) -> Vec<ChangeRecord> {
    let mut comp = Compare::default();
    comp.compare_value(old, new, target, label);
    comp.changes
}

impl Compare {
    pub(crate) fn compare_value(
        &mut self,
        old: Option<&Value>,
        new: Option<&Value>,
        target: Target<'_>,
        label: &str,
    ) {
        self.compare_leaf(old, new, target, |verb| format!("{label} {verb}"));
    }

    /// The presence rules behind every comparator. `describe` receives the
    /// verb ("added", "removed" or "changed") and builds the description.
    pub(crate) fn compare_leaf(
        &mut self,
        old: Option<&Value>,
        new: Option<&Value>,
        target: Target<'_>,
        describe: impl Fn(&str) -> String,
    ) {
        let old = old.filter(|value| !value.is_null());
        let new = new.filter(|value| !value.is_null());

        let record = match (old, new) {
            (None, None) => return,
            (None, Some(new)) => target
                .record(ChangeType::Added, describe("added"))
                .with_values(None, Some(new.clone())),
            (Some(old), None) => target
                .record(ChangeType::Removed, describe("removed"))
                .with_values(Some(old.clone()), None),
            (Some(old), Some(new)) if json_equal(old, new) => return,
            (Some(old), Some(new)) => target
                .record(ChangeType::Modified, describe("changed"))
                .with_values(Some(old.clone()), Some(new.clone())),
        };

        self.push_change(record);
    }
}
