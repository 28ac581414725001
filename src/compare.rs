// Copyright 2026 Oxide Computer Company

use serde_json::{Value, json};

use crate::{
    Analysis, ChangeCategory, ChangeRecord, ChangeType, Severity, VersionMetadata,
    align::{MatchedPath, PathEntry, build_path_mapping},
    operation::{methods, operation_path},
    value::{Target, json_equal, member, present},
};

/// Compare two OpenAPI 3.x or Swagger 2.0 documents.
///
/// The comparison is pure: neither document is modified, and the same pair
/// of documents always produces the same records in the same order. Missing
/// sections are treated as empty.
pub fn analyze_changes(old: &Value, new: &Value) -> Analysis {
    let mut comp = Compare::default();
    comp.compare(old, new);

    Analysis::new(comp.changes)
}

/// `components` sub-collections with the category and severity their entries
/// are reported under.
const COMPONENTS: [(&str, ChangeCategory, Severity); 9] = [
    ("schemas", ChangeCategory::Schema, Severity::Medium),
    ("securitySchemes", ChangeCategory::SecurityScheme, Severity::High),
    ("parameters", ChangeCategory::Parameter, Severity::Medium),
    ("requestBodies", ChangeCategory::RequestBody, Severity::Medium),
    ("responses", ChangeCategory::Response, Severity::Medium),
    ("headers", ChangeCategory::Header, Severity::Low),
    ("examples", ChangeCategory::Example, Severity::Low),
    ("links", ChangeCategory::Link, Severity::Low),
    ("callbacks", ChangeCategory::Callback, Severity::Medium),
];

/// Swagger 2.0 root fields that describe where and how the API is served.
const SWAGGER2_FIELDS: [(&str, ChangeCategory, Severity, &str); 5] = [
    ("basePath", ChangeCategory::Server, Severity::Medium, "base path"),
    ("host", ChangeCategory::Server, Severity::Medium, "host"),
    ("schemes", ChangeCategory::Server, Severity::Medium, "schemes"),
    ("consumes", ChangeCategory::Info, Severity::Low, "consumed content types"),
    ("produces", ChangeCategory::Info, Severity::Low, "produced content types"),
];

#[derive(Default)]
pub(crate) struct Compare {
    pub changes: Vec<ChangeRecord>,
}

impl Compare {
    pub fn compare(&mut self, old: &Value, new: &Value) {
        self.compare_value(
            spec_version(old),
            spec_version(new),
            Target::new(ChangeCategory::Info, "root", Severity::Low).field("openapi/swagger"),
            "OpenAPI/Swagger version",
        );
        self.compare_info(present(old, "info"), present(new, "info"));
        self.compare_keyed_array(
            present(old, "servers"),
            present(new, "servers"),
            Target::new(ChangeCategory::Server, "servers", Severity::Medium),
            "url",
        );
        self.compare_whole(
            present(old, "security"),
            present(new, "security"),
            Target::new(ChangeCategory::Security, "security", Severity::High),
            "security requirements",
        );
        self.compare_keyed_array(
            present(old, "tags"),
            present(new, "tags"),
            Target::new(ChangeCategory::Tag, "tags", Severity::Low),
            "name",
        );
        self.compare_value(
            present(old, "externalDocs"),
            present(new, "externalDocs"),
            Target::new(ChangeCategory::ExternalDocs, "externalDocs", Severity::Low)
                .field("externalDocs"),
            "external docs",
        );
        self.compare_paths(present(old, "paths"), present(new, "paths"));
        self.compare_components(present(old, "components"), present(new, "components"));
        self.compare_swagger2(old, new);
    }

    fn compare_info(&mut self, old_info: Option<&Value>, new_info: Option<&Value>) {
        for (field, label) in [
            ("title", "API title"),
            ("description", "API description"),
            ("termsOfService", "terms of service"),
            ("version", "API version"),
        ] {
            self.compare_value(
                member(old_info, field),
                member(new_info, field),
                Target::new(ChangeCategory::Info, "info", Severity::Low).field(field),
                label,
            );
        }

        // Contact and license are compared as whole objects, a missing one
        // counting as `{}`. Any difference is a single `modified` record.
        let empty = json!({});
        for (field, label) in [
            ("contact", "contact information"),
            ("license", "license information"),
        ] {
            let (old_value, new_value) = (member(old_info, field), member(new_info, field));
            if !json_equal(old_value.unwrap_or(&empty), new_value.unwrap_or(&empty)) {
                let record = Target::new(ChangeCategory::Info, "info", Severity::Low)
                    .field(field)
                    .record(ChangeType::Modified, format!("{label} changed"))
                    .with_values(old_value.cloned(), new_value.cloned());
                self.push_change(record);
            }
        }
    }

    fn compare_paths(&mut self, old_paths: Option<&Value>, new_paths: Option<&Value>) {
        let mapping = build_path_mapping(old_paths, new_paths);

        for entry in &mapping.new_only {
            self.push_endpoint(ChangeType::Added, entry, "endpoint added");
        }

        for entry in &mapping.old_only {
            self.push_endpoint(ChangeType::Removed, entry, "endpoint removed");
        }

        for matched in &mapping.matched {
            self.compare_matched_path(matched);
        }
    }

    /// Report every operation of a path that exists on one side only.
    fn push_endpoint(&mut self, change_type: ChangeType, entry: &PathEntry<'_>, message: &str) {
        for method in methods(entry.spec) {
            let path = operation_path(method, entry.original_path);
            let operation = present(entry.spec, method).cloned();
            let record = ChangeRecord::new(
                change_type,
                ChangeCategory::Endpoint,
                &path,
                Severity::High,
                format!("{message}: {path}"),
            )
            .with_values(operation.clone(), operation);
            self.push_change(record);
        }
    }

    fn compare_matched_path(&mut self, matched: &MatchedPath<'_>) {
        let MatchedPath {
            normalized_key,
            old,
            new,
            version_changed,
        } = matched;

        self.compare_path_item(old.spec, new.spec, new.original_path);

        let mut all_methods = methods(old.spec);
        for method in methods(new.spec) {
            if !all_methods.contains(&method) {
                all_methods.push(method);
            }
        }

        for method in all_methods {
            let old_path = operation_path(method, old.original_path);
            let new_path = operation_path(method, new.original_path);

            match (present(old.spec, method), present(new.spec, method)) {
                (None, None) => {}
                (None, Some(new_op)) => {
                    let record = ChangeRecord::new(
                        ChangeType::Added,
                        ChangeCategory::Endpoint,
                        &new_path,
                        Severity::High,
                        format!("method added: {new_path}"),
                    )
                    .with_values(None, Some(new_op.clone()));
                    self.push_change(record);
                }
                (Some(old_op), None) => {
                    let record = ChangeRecord::new(
                        ChangeType::Removed,
                        ChangeCategory::Endpoint,
                        &old_path,
                        Severity::High,
                        format!("method removed: {old_path}"),
                    )
                    .with_values(Some(old_op.clone()), None);
                    self.push_change(record);
                }
                (Some(old_op), Some(new_op)) if !version_changed => {
                    self.compare_operation(old_op, new_op, &new_path);
                }
                (Some(old_op), Some(new_op)) => {
                    let unchanged = json_equal(old_op, new_op);
                    let (change_type, field, severity, message) = if unchanged {
                        (
                            ChangeType::PathVersionChanged,
                            "path",
                            Severity::Medium,
                            "path version changed",
                        )
                    } else {
                        (
                            ChangeType::Modified,
                            "path_and_spec",
                            Severity::High,
                            "path version and operation changed",
                        )
                    };

                    let record = ChangeRecord::new(
                        change_type,
                        ChangeCategory::Endpoint,
                        &new_path,
                        severity,
                        format!(
                            "{message}: {} -> {}",
                            old.original_path, new.original_path
                        ),
                    )
                    .with_field(Some(field))
                    .with_values(Some(path_version(old)), Some(path_version(new)))
                    .with_metadata(VersionMetadata {
                        version_changed: !unchanged,
                        old_path: old.original_path.to_string(),
                        new_path: new.original_path.to_string(),
                        normalized_path: normalized_key.clone(),
                        old_version: old.version_prefix.clone(),
                        new_version: new.version_prefix.clone(),
                    });
                    self.push_change(record);

                    // The coarse record above says the endpoint moved; the
                    // operation comparison says what else changed.
                    if !unchanged {
                        self.compare_operation(old_op, new_op, &new_path);
                    }
                }
            }
        }
    }

    fn compare_components(
        &mut self,
        old_components: Option<&Value>,
        new_components: Option<&Value>,
    ) {
        for (name, category, severity) in COMPONENTS {
            self.compare_object_map(
                member(old_components, name),
                member(new_components, name),
                category,
                &format!("components/{name}"),
                severity,
            );
        }
    }

    fn compare_swagger2(&mut self, old: &Value, new: &Value) {
        for (key, category, severity) in [
            ("definitions", ChangeCategory::Schema, Severity::Medium),
            ("securityDefinitions", ChangeCategory::SecurityScheme, Severity::High),
        ] {
            let (old_map, new_map) = (present(old, key), present(new, key));
            if old_map.is_some() || new_map.is_some() {
                self.compare_object_map(old_map, new_map, category, key, severity);
            }
        }

        for (key, category, severity, label) in SWAGGER2_FIELDS {
            self.compare_value(
                present(old, key),
                present(new, key),
                Target::new(category, "root", severity).field(key),
                label,
            );
        }
    }

    pub(crate) fn push_change(&mut self, change: ChangeRecord) {
        self.changes.push(change);
    }
}

/// The `openapi` field of an OpenAPI 3.x document or the `swagger` field of
/// a Swagger 2.0 one.
fn spec_version(document: &Value) -> Option<&Value> {
    present(document, "openapi").or_else(|| present(document, "swagger"))
}

fn path_version(entry: &PathEntry<'_>) -> Value {
    json!({
        "path": entry.original_path,
        "version": entry.version_prefix,
    })
}
