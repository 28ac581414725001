// Copyright 2026 Oxide Computer Company

//! Checks and measurements of a whole document, used when a new revision is
//! recorded.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::value::{as_map, present};

/// Methods counted by [`count_endpoints`].
const COUNTED_METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "options", "head"];

/// Which flavor of API description a document is, with its declared version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// An OpenAPI 3.x document and its `openapi` field.
    OpenApi3(String),
    /// A Swagger 2.0 document and its `swagger` field.
    Swagger2(String),
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::OpenApi3(version) => write!(f, "OpenAPI {version}"),
            DocumentKind::Swagger2(version) => write!(f, "Swagger {version}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document is not a JSON object (found {0})")]
    NotAnObject(&'static str),
    #[error("document has no \"openapi\" or \"swagger\" version field")]
    MissingDiscriminator,
}

/// Check that `document` is an OpenAPI or Swagger document at all.
///
/// Only the version field is inspected; the rest of the document may be
/// arbitrarily incomplete.
pub fn validate_document(document: &Value) -> Result<DocumentKind, DocumentError> {
    if !document.is_object() {
        return Err(DocumentError::NotAnObject(type_name(document)));
    }

    // Empty strings and `false` do not identify a document.
    let version = |key: &str| {
        present(document, key)
            .filter(|v| !matches!(v, Value::Bool(false)) && v.as_str() != Some(""))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    };

    if let Some(version) = version("openapi") {
        Ok(DocumentKind::OpenApi3(version))
    } else if let Some(version) = version("swagger") {
        Ok(DocumentKind::Swagger2(version))
    } else {
        Err(DocumentError::MissingDiscriminator)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The number of operations in the document.
pub fn count_endpoints(document: &Value) -> usize {
    as_map(present(document, "paths"))
        .values()
        .map(|item| {
            COUNTED_METHODS
                .iter()
                .filter(|method| item.get(**method).is_some())
                .count()
        })
        .sum()
}

/// The major version a document is filed under: the `v<N>` segment of its
/// first path, or `v1` when that path has none.
pub fn extract_major_version(document: &Value) -> String {
    static PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)/v(\d+)(/|$)").unwrap());

    as_map(present(document, "paths"))
        .keys()
        .next()
        .and_then(|path| PATTERN.captures(path))
        .map(|captures| format!("v{}", &captures[1]))
        .unwrap_or_else(|| "v1".to_string())
}
