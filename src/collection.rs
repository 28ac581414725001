// Copyright 2026 Oxide Computer Company

//! Comparators for keyed collections: `{name: value}` maps and lists of
//! items identified by one of their fields.

use serde_json::{Value, json};

use crate::{
    ChangeCategory, ChangeRecord, ChangeType, Severity,
    compare::Compare,
    setops::{Pairing, SetCompare},
    value::{Target, as_list, as_map, json_equal},
};

/// Compare two `{key: value}` maps entry by entry.
///
/// Each key yields at most one record with `field` set to the key and `path`
/// set to `base_path`. A missing or non-object map is treated as empty.
pub fn compare_object_map(
    old: Option<&Value>,
    new: Option<&Value>,
    category: ChangeCategory,
    base_path: &str,
    severity: Severity,
) -> Vec<ChangeRecord> {
    let mut comp = Compare::default();
    comp.compare_object_map(old, new, category, base_path, severity);
    comp.changes
}

/// Compare two lists.
///
/// With a `key_field`, items are matched by the value of that field and each
/// key yields at most one added, removed or modified record. Without one the
/// list is a single unit: one `modified` record carrying both full lists when
/// they differ.
pub fn compare_array(
    old: Option<&Value>,
    new: Option<&Value>,
    category: ChangeCategory,
    path: &str,
    key_field: Option<&str>,
    severity: Severity,
) -> Vec<ChangeRecord> {
    let mut comp = Compare::default();
    let target = Target::new(category, path, severity);
    match key_field {
        Some(key_field) => comp.compare_keyed_array(old, new, target, key_field),
        None => comp.compare_whole(old, new, target, &format!("{category} list")),
    }
    comp.changes
}

/// The identity of a list item, taken from its key field.
///
/// String keys are kept as they are; any other key is held in its JSON form,
/// so the number `1` and the string `"1"` stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum ItemKey {
    Text(String),
    Json(String),
}

impl ItemKey {
    fn of(item: &Value, key_field: &str) -> Option<ItemKey> {
        item.get(key_field).map(|key| match key {
            Value::String(s) => ItemKey::Text(s.clone()),
            other => ItemKey::Json(other.to_string()),
        })
    }

    fn as_str(&self) -> &str {
        match self {
            ItemKey::Text(s) | ItemKey::Json(s) => s,
        }
    }
}

fn keyed_items<'a>(items: &'a [Value], key_field: &str) -> Vec<(Option<ItemKey>, &'a Value)> {
    items
        .iter()
        .map(|item| (ItemKey::of(item, key_field), item))
        .collect()
}

impl Compare {
    pub(crate) fn compare_object_map(
        &mut self,
        old: Option<&Value>,
        new: Option<&Value>,
        category: ChangeCategory,
        base_path: &str,
        severity: Severity,
    ) {
        let cmp = SetCompare::new(as_map(old), as_map(new));

        for (key, pairing) in cmp.iter() {
            let (old_value, new_value) = match pairing {
                Pairing::AOnly(old_value) => (Some(*old_value), None),
                Pairing::Both(old_value, new_value) => (Some(*old_value), Some(*new_value)),
                Pairing::BOnly(new_value) => (None, Some(*new_value)),
            };
            let target = Target::new(category, base_path, severity).field(key);
            self.compare_leaf(old_value, new_value, target, |verb| {
                format!("{category} {verb}: {key}")
            });
        }
    }

    pub(crate) fn compare_keyed_array(
        &mut self,
        old: Option<&Value>,
        new: Option<&Value>,
        target: Target<'_>,
        key_field: &str,
    ) {
        let cmp = SetCompare::new(
            keyed_items(as_list(old), key_field),
            keyed_items(as_list(new), key_field),
        );
        let category = target.category;
        let describe = |key: &Option<ItemKey>| {
            let key = key.as_ref().map_or("<unnamed>", ItemKey::as_str).to_string();
            move |verb: &str| format!("{category} {verb}: {key}")
        };

        for (key, item) in cmp.b_unique() {
            let target = Target {
                field: key.as_ref().map(ItemKey::as_str),
                ..target
            };
            self.compare_leaf(None, Some(*item), target, describe(key));
        }
        for (key, item) in cmp.a_unique() {
            let target = Target {
                field: key.as_ref().map(ItemKey::as_str),
                ..target
            };
            self.compare_leaf(Some(*item), None, target, describe(key));
        }
        for (key, old_item, new_item) in cmp.common() {
            let target = Target {
                field: key.as_ref().map(ItemKey::as_str),
                ..target
            };
            self.compare_leaf(Some(*old_item), Some(*new_item), target, describe(key));
        }
    }

    /// Compare two lists as single units. A missing list counts as empty, so
    /// a `modified` record always carries both sides.
    pub(crate) fn compare_whole(
        &mut self,
        old: Option<&Value>,
        new: Option<&Value>,
        target: Target<'_>,
        label: &str,
    ) {
        let empty = json!([]);
        let old = old.filter(|value| !value.is_null()).unwrap_or(&empty);
        let new = new.filter(|value| !value.is_null()).unwrap_or(&empty);

        if !json_equal(old, new) {
            let record = target
                .record(ChangeType::Modified, format!("{label} changed"))
                .with_values(Some(old.clone()), Some(new.clone()));
            self.push_change(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn summarize(changes: &[ChangeRecord]) -> Vec<(ChangeType, Option<&str>)> {
        changes
            .iter()
            .map(|c| (c.change_type, c.field.as_deref()))
            .collect()
    }

    #[test]
    fn map_comparator_completeness() {
        let changes = compare_object_map(
            Some(&json!({"a": 1, "b": 2})),
            Some(&json!({"b": 3, "c": 4})),
            ChangeCategory::Schema,
            "components/schemas",
            Severity::Medium,
        );

        assert_eq!(
            summarize(&changes),
            vec![
                (ChangeType::Removed, Some("a")),
                (ChangeType::Modified, Some("b")),
                (ChangeType::Added, Some("c")),
            ]
        );
        assert!(changes.iter().all(|c| c.path == "components/schemas"));
        assert!(changes.iter().all(|c| c.severity == Severity::Medium));
        assert_eq!(changes[0].description, "schema removed: a");
        assert_eq!(changes[2].old_value, None);
        assert_eq!(changes[2].new_value, Some(json!(4)));
    }

    #[test]
    fn map_comparator_tolerates_missing_maps() {
        assert!(
            compare_object_map(None, Some(&Value::Null), ChangeCategory::Link, "x", Severity::Low)
                .is_empty()
        );

        let changes = compare_object_map(
            None,
            Some(&json!({"Pet": {"type": "object"}})),
            ChangeCategory::Schema,
            "components/schemas",
            Severity::Medium,
        );
        assert_eq!(summarize(&changes), vec![(ChangeType::Added, Some("Pet"))]);
    }

    #[test]
    fn map_entries_holding_null_are_absent() {
        let changes = compare_object_map(
            Some(&json!({"a": null})),
            Some(&json!({})),
            ChangeCategory::Schema,
            "definitions",
            Severity::Medium,
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn keyed_array() {
        let old = json!([
            {"url": "https://a.example.com"},
            {"url": "https://b.example.com", "description": "b"},
        ]);
        let new = json!([
            {"url": "https://b.example.com", "description": "bee"},
            {"url": "https://c.example.com"},
        ]);

        let changes = compare_array(
            Some(&old),
            Some(&new),
            ChangeCategory::Server,
            "servers",
            Some("url"),
            Severity::Medium,
        );

        assert_eq!(
            summarize(&changes),
            vec![
                (ChangeType::Added, Some("https://c.example.com")),
                (ChangeType::Removed, Some("https://a.example.com")),
                (ChangeType::Modified, Some("https://b.example.com")),
            ]
        );
        assert_eq!(changes[0].description, "server added: https://c.example.com");
    }

    #[test]
    fn keyed_array_reordering_is_not_a_change() {
        let old = json!([{"name": "a"}, {"name": "b"}]);
        let new = json!([{"name": "b"}, {"name": "a"}]);
        let changes = compare_array(
            Some(&old),
            Some(&new),
            ChangeCategory::Tag,
            "tags",
            Some("name"),
            Severity::Low,
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn keyed_array_keeps_key_types_apart() {
        let old = json!([{"name": 1, "description": "number"}]);
        let new = json!([{"name": "1", "description": "string"}]);
        let changes = compare_array(
            Some(&old),
            Some(&new),
            ChangeCategory::Tag,
            "tags",
            Some("name"),
            Severity::Low,
        );

        assert_eq!(
            summarize(&changes),
            vec![(ChangeType::Added, Some("1")), (ChangeType::Removed, Some("1"))]
        );
        assert_eq!(changes[0].new_value, Some(new[0].clone()));
        assert_eq!(changes[1].old_value, Some(old[0].clone()));

        let same = compare_array(
            Some(&old),
            Some(&old),
            ChangeCategory::Tag,
            "tags",
            Some("name"),
            Severity::Low,
        );
        assert!(same.is_empty());
    }

    #[test]
    fn whole_array() {
        let old = json!(["a", "b"]);
        let new = json!(["b", "a"]);

        let changes = compare_array(
            Some(&old),
            Some(&new),
            ChangeCategory::Security,
            "security",
            None,
            Severity::High,
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Modified);
        assert_eq!(changes[0].field, None);
        assert_eq!(changes[0].old_value, Some(old.clone()));
        assert_eq!(changes[0].new_value, Some(new));

        let unchanged = compare_array(
            Some(&old),
            Some(&old),
            ChangeCategory::Security,
            "security",
            None,
            Severity::High,
        );
        assert!(unchanged.is_empty());
    }

    #[test]
    fn whole_array_missing_counts_as_empty() {
        let changes = compare_array(
            None,
            Some(&json!([])),
            ChangeCategory::Security,
            "security",
            None,
            Severity::High,
        );
        assert!(changes.is_empty());

        let changes = compare_array(
            None,
            Some(&json!([{"api_key": []}])),
            ChangeCategory::Security,
            "security",
            None,
            Severity::High,
        );
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Some(json!([])));
    }
}
