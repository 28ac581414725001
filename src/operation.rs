// Copyright 2026 Oxide Computer Company

use serde_json::Value;

use crate::{
    ChangeCategory, ChangeRecord, Severity,
    compare::Compare,
    setops::{Pairing, SetCompare},
    value::{Target, as_list, as_map, present},
};

/// Keys of a path item that hold operations.
pub(crate) const HTTP_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// The HTTP methods defined on a path item, in document order.
pub(crate) fn methods(path_item: &Value) -> Vec<&str> {
    as_map(Some(path_item))
        .iter()
        .filter(|(key, value)| HTTP_METHODS.contains(&key.as_str()) && !value.is_null())
        .map(|(key, _)| key.as_str())
        .collect()
}

/// Format the human-readable location of an operation, e.g. `GET /users`.
pub(crate) fn operation_path(method: &str, path: &str) -> String {
    format!("{} {}", method.to_uppercase(), path)
}

/// Compare two versions of the same operation.
///
/// `path` is the location reported on every record (typically
/// `"<METHOD> <path>"`).
pub fn compare_operation(old_op: &Value, new_op: &Value, path: &str) -> Vec<ChangeRecord> {
    let mut comp = Compare::default();
    comp.compare_operation(old_op, new_op, path);
    comp.changes
}

/// Parameters are identified by name and location; a parameter given only
/// as a `$ref` is identified by its reference.
fn parameter_key(param: &Value) -> String {
    let name = param.get("name").and_then(Value::as_str);
    let location = param.get("in").and_then(Value::as_str);
    match (name, location, param.get("$ref").and_then(Value::as_str)) {
        (None, None, Some(reference)) => format!("$ref:{reference}"),
        (name, location, _) => {
            format!("{}:{}", name.unwrap_or_default(), location.unwrap_or_default())
        }
    }
}

fn parameter_name(param: &Value) -> Option<&str> {
    param
        .get("name")
        .or_else(|| param.get("$ref"))
        .and_then(Value::as_str)
}

fn parameter_label(param: &Value) -> String {
    let name = parameter_name(param).unwrap_or("<unnamed>");
    match param.get("in").and_then(Value::as_str) {
        Some(location) => format!("{name} ({location})"),
        None => name.to_string(),
    }
}

fn keyed_parameters(params: Option<&Value>) -> Vec<(String, &Value)> {
    as_list(params)
        .iter()
        .map(|param| (parameter_key(param), param))
        .collect()
}

fn parameter_target<'a>(param: &'a Value, path: &'a str, severity: Severity) -> Target<'a> {
    Target {
        field: parameter_name(param),
        ..Target::new(ChangeCategory::Parameter, path, severity)
    }
}

impl Compare {
    pub(crate) fn compare_operation(&mut self, old_op: &Value, new_op: &Value, path: &str) {
        self.compare_parameters(
            present(old_op, "parameters"),
            present(new_op, "parameters"),
            path,
        );
        self.compare_value(
            present(old_op, "requestBody"),
            present(new_op, "requestBody"),
            Target::new(ChangeCategory::RequestBody, path, Severity::Medium).field("requestBody"),
            "request body",
        );
        self.compare_responses(
            present(old_op, "responses"),
            present(new_op, "responses"),
            path,
        );

        for (key, category, severity, label) in [
            ("operationId", ChangeCategory::Endpoint, Severity::Low, "operation ID"),
            ("summary", ChangeCategory::Description, Severity::Low, "summary"),
            ("description", ChangeCategory::Description, Severity::Low, "description"),
            ("tags", ChangeCategory::Tag, Severity::Low, "tags"),
            // Deprecation matters to clients whichever way it goes.
            ("deprecated", ChangeCategory::Endpoint, Severity::High, "deprecation"),
        ] {
            self.compare_value(
                present(old_op, key),
                present(new_op, key),
                Target::new(category, path, severity).field(key),
                label,
            );
        }

        self.compare_whole(
            present(old_op, "security"),
            present(new_op, "security"),
            Target::new(ChangeCategory::Security, path, Severity::High),
            "security requirements",
        );
        self.compare_keyed_array(
            present(old_op, "servers"),
            present(new_op, "servers"),
            Target::new(ChangeCategory::Server, path, Severity::Medium),
            "url",
        );
        self.compare_object_map(
            present(old_op, "callbacks"),
            present(new_op, "callbacks"),
            ChangeCategory::Callback,
            path,
            Severity::Medium,
        );
        self.compare_value(
            present(old_op, "externalDocs"),
            present(new_op, "externalDocs"),
            Target::new(ChangeCategory::ExternalDocs, path, Severity::Low).field("externalDocs"),
            "external docs",
        );
    }

    /// Compare the members of two path items that apply to all of their
    /// operations.
    pub(crate) fn compare_path_item(&mut self, old_item: &Value, new_item: &Value, path: &str) {
        self.compare_parameters(
            present(old_item, "parameters"),
            present(new_item, "parameters"),
            path,
        );
        self.compare_value(
            present(old_item, "summary"),
            present(new_item, "summary"),
            Target::new(ChangeCategory::Description, path, Severity::Low).field("summary"),
            &format!("path summary ({path})"),
        );
        self.compare_value(
            present(old_item, "description"),
            present(new_item, "description"),
            Target::new(ChangeCategory::Description, path, Severity::Low).field("description"),
            &format!("path description ({path})"),
        );
        self.compare_keyed_array(
            present(old_item, "servers"),
            present(new_item, "servers"),
            Target::new(ChangeCategory::Server, path, Severity::Medium),
            "url",
        );
    }

    pub(crate) fn compare_parameters(
        &mut self,
        old_params: Option<&Value>,
        new_params: Option<&Value>,
        path: &str,
    ) {
        let cmp = SetCompare::new(keyed_parameters(old_params), keyed_parameters(new_params));

        // A new parameter that clients must send is more disruptive than an
        // optional one.
        for (_, param) in cmp.b_unique() {
            let required = param.get("required").and_then(Value::as_bool) == Some(true);
            let severity = if required {
                Severity::Medium
            } else {
                Severity::Low
            };
            let label = parameter_label(param);
            let target = parameter_target(param, path, severity);
            self.compare_leaf(None, Some(*param), target, |verb| {
                format!("parameter {verb}: {label}")
            });
        }

        for (_, param) in cmp.a_unique() {
            let label = parameter_label(param);
            let target = parameter_target(param, path, Severity::Medium);
            self.compare_leaf(Some(*param), None, target, |verb| {
                format!("parameter {verb}: {label}")
            });
        }

        for (_, old_param, new_param) in cmp.common() {
            let label = parameter_label(new_param);
            self.compare_leaf(
                Some(*old_param),
                Some(*new_param),
                parameter_target(new_param, path, Severity::Low),
                |verb| format!("parameter {verb}: {label}"),
            );
        }
    }

    fn compare_responses(
        &mut self,
        old_responses: Option<&Value>,
        new_responses: Option<&Value>,
        path: &str,
    ) {
        let cmp = SetCompare::new(as_map(old_responses), as_map(new_responses));

        for (status, pairing) in cmp.iter() {
            let (old_response, new_response) = match pairing {
                Pairing::AOnly(old) => (Some(*old), None),
                Pairing::Both(old, new) => (Some(*old), Some(*new)),
                Pairing::BOnly(new) => (None, Some(*new)),
            };
            let field = format!("response-{status}");
            let target = Target::new(ChangeCategory::Response, path, Severity::Low).field(&field);
            self.compare_leaf(old_response, new_response, target, |verb| {
                format!("response {status} {verb}")
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ChangeType;

    fn kinds(changes: &[ChangeRecord]) -> Vec<(ChangeType, ChangeCategory, Option<&str>)> {
        changes
            .iter()
            .map(|c| (c.change_type, c.category, c.field.as_deref()))
            .collect()
    }

    #[test]
    fn methods_in_document_order() {
        let item = json!({
            "summary": "users",
            "post": {},
            "parameters": [],
            "get": {},
            "trace": null,
            "x-internal": true,
        });
        assert_eq!(methods(&item), vec!["post", "get"]);
        assert!(methods(&json!("not a path item")).is_empty());
    }

    #[test]
    fn operation_path_uppercases_method() {
        assert_eq!(operation_path("get", "/v1/users/{id}"), "GET /v1/users/{id}");
    }

    #[test]
    fn identical_operations_have_no_changes() {
        let op = json!({
            "operationId": "listUsers",
            "parameters": [{"name": "limit", "in": "query"}],
            "responses": {"200": {"description": "ok"}},
            "security": [{"oauth": ["read"]}],
        });
        assert!(compare_operation(&op, &op, "GET /users").is_empty());
    }

    #[test]
    fn parameter_severity_follows_required() {
        let old = json!({});
        let new = json!({
            "parameters": [
                {"name": "id", "in": "path", "required": true},
                {"name": "limit", "in": "query", "required": false},
                {"name": "cursor", "in": "query"},
            ]
        });

        let changes = compare_operation(&old, &new, "GET /users");
        let severities = changes
            .iter()
            .map(|c| (c.field.as_deref(), c.severity))
            .collect::<Vec<_>>();
        assert_eq!(
            severities,
            vec![
                (Some("id"), Severity::Medium),
                (Some("limit"), Severity::Low),
                (Some("cursor"), Severity::Low),
            ]
        );
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Added));
        assert_eq!(changes[0].description, "parameter added: id (path)");
    }

    #[test]
    fn parameters_are_keyed_by_name_and_location() {
        let old = json!({
            "parameters": [
                {"name": "id", "in": "query"},
                {"name": "page", "in": "query", "schema": {"type": "integer"}},
            ]
        });
        let new = json!({
            "parameters": [
                {"name": "id", "in": "header"},
                {"name": "page", "in": "query", "schema": {"type": "string"}},
            ]
        });

        let changes = compare_operation(&old, &new, "GET /users");
        assert_eq!(
            kinds(&changes),
            vec![
                (ChangeType::Added, ChangeCategory::Parameter, Some("id")),
                (ChangeType::Removed, ChangeCategory::Parameter, Some("id")),
                (ChangeType::Modified, ChangeCategory::Parameter, Some("page")),
            ]
        );
        assert_eq!(changes[1].severity, Severity::Medium);
        assert_eq!(changes[2].severity, Severity::Low);
    }

    #[test]
    fn referenced_parameters_are_distinct() {
        let old = json!({
            "parameters": [
                {"$ref": "#/components/parameters/Limit"},
                {"$ref": "#/components/parameters/Offset"},
            ]
        });
        let new = json!({
            "parameters": [{"$ref": "#/components/parameters/Limit"}]
        });

        let changes = compare_operation(&old, &new, "GET /users");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Removed);
        assert_eq!(
            changes[0].field.as_deref(),
            Some("#/components/parameters/Offset")
        );
    }

    #[test]
    fn responses_by_status_code() {
        let old = json!({
            "responses": {
                "200": {"description": "ok"},
                "404": {"description": "missing"},
            }
        });
        let new = json!({
            "responses": {
                "200": {"description": "fine"},
                "201": {"description": "created"},
            }
        });

        let changes = compare_operation(&old, &new, "POST /users");
        assert_eq!(
            kinds(&changes),
            vec![
                (ChangeType::Modified, ChangeCategory::Response, Some("response-200")),
                (ChangeType::Removed, ChangeCategory::Response, Some("response-404")),
                (ChangeType::Added, ChangeCategory::Response, Some("response-201")),
            ]
        );
        assert!(changes.iter().all(|c| c.severity == Severity::Low));
        assert_eq!(changes[2].description, "response 201 added");
    }

    #[test]
    fn metadata_and_overrides() {
        let old = json!({
            "operationId": "listUsers",
            "summary": "List users",
            "tags": ["users"],
            "requestBody": {"content": {}},
            "security": [{"oauth": ["read"]}],
            "servers": [{"url": "https://a.example.com"}],
            "callbacks": {"onEvent": {}},
        });
        let new = json!({
            "operationId": "listUsers",
            "summary": "List all users",
            "tags": ["users", "admin"],
            "deprecated": true,
            "security": [{"oauth": ["write"]}],
            "servers": [{"url": "https://b.example.com"}],
            "callbacks": {"onEvent": {}},
            "externalDocs": {"url": "https://docs.example.com"},
        });

        let changes = compare_operation(&old, &new, "GET /users");
        assert_eq!(
            kinds(&changes),
            vec![
                (ChangeType::Removed, ChangeCategory::RequestBody, Some("requestBody")),
                (ChangeType::Modified, ChangeCategory::Description, Some("summary")),
                (ChangeType::Modified, ChangeCategory::Tag, Some("tags")),
                (ChangeType::Added, ChangeCategory::Endpoint, Some("deprecated")),
                (ChangeType::Modified, ChangeCategory::Security, None),
                (ChangeType::Added, ChangeCategory::Server, Some("https://b.example.com")),
                (ChangeType::Removed, ChangeCategory::Server, Some("https://a.example.com")),
                (ChangeType::Added, ChangeCategory::ExternalDocs, Some("externalDocs")),
            ]
        );

        let severity_of = |category: ChangeCategory| {
            changes
                .iter()
                .find(|c| c.category == category)
                .map(|c| c.severity)
        };
        assert_eq!(severity_of(ChangeCategory::RequestBody), Some(Severity::Medium));
        assert_eq!(severity_of(ChangeCategory::Endpoint), Some(Severity::High));
        assert_eq!(severity_of(ChangeCategory::Security), Some(Severity::High));
        assert_eq!(severity_of(ChangeCategory::Server), Some(Severity::Medium));
        assert!(changes.iter().all(|c| c.path == "GET /users"));
    }

    #[test]
    fn path_item_members() {
        let old = json!({
            "summary": "Users",
            "parameters": [{"name": "tenant", "in": "header", "required": true}],
            "get": {},
        });
        let new = json!({
            "summary": "All users",
            "description": "Everything about users",
            "servers": [{"url": "https://users.example.com"}],
            "get": {"summary": "ignored here"},
        });

        let mut comp = Compare::default();
        comp.compare_path_item(&old, &new, "/v1/users");
        assert_eq!(
            kinds(&comp.changes),
            vec![
                (ChangeType::Removed, ChangeCategory::Parameter, Some("tenant")),
                (ChangeType::Modified, ChangeCategory::Description, Some("summary")),
                (ChangeType::Added, ChangeCategory::Description, Some("description")),
                (ChangeType::Added, ChangeCategory::Server, Some("https://users.example.com")),
            ]
        );
        assert!(comp.changes.iter().all(|c| c.path == "/v1/users"));
    }
}
