// Copyright 2026 Oxide Computer Company

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One classified difference between two revisions of an OpenAPI document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// What happened to the item.
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// The part of the document the item belongs to.
    pub category: ChangeCategory,
    /// Human-readable location: a root section such as `info` or
    /// `components/schemas`, or an endpoint such as `GET /v2/users/{id}`.
    pub path: String,
    /// The specific key that changed within `path`, if any.
    pub field: Option<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    /// Human-readable message describing the nature of the change.
    pub description: String,
    pub severity: Severity,
    /// Only present on endpoint changes that moved between path versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VersionMetadata>,
}

impl ChangeRecord {
    pub fn new(
        change_type: ChangeType,
        category: ChangeCategory,
        path: impl ToString,
        severity: Severity,
        description: impl ToString,
    ) -> Self {
        Self {
            change_type,
            category,
            path: path.to_string(),
            field: None,
            old_value: None,
            new_value: None,
            description: description.to_string(),
            severity,
            metadata: None,
        }
    }

    pub fn with_field(mut self, field: Option<impl ToString>) -> Self {
        self.field = field.map(|f| f.to_string());
        self
    }

    /// Attach the before and after values. `added` records never carry an
    /// old value and `removed` records never carry a new one.
    pub fn with_values(mut self, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        self.old_value = match self.change_type {
            ChangeType::Added => None,
            _ => old_value,
        };
        self.new_value = match self.change_type {
            ChangeType::Removed => None,
            _ => new_value,
        };
        self
    }

    pub fn with_metadata(mut self, metadata: VersionMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    /// The same operation now lives under a different version segment of
    /// its path, with no other difference.
    PathVersionChanged,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::PathVersionChanged => "path_version_changed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeCategory {
    Endpoint,
    Parameter,
    RequestBody,
    Response,
    Schema,
    Info,
    Description,
    Server,
    Security,
    Tag,
    ExternalDocs,
    SecurityScheme,
    Header,
    Example,
    Link,
    Callback,
}

impl ChangeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeCategory::Endpoint => "endpoint",
            ChangeCategory::Parameter => "parameter",
            ChangeCategory::RequestBody => "requestBody",
            ChangeCategory::Response => "response",
            ChangeCategory::Schema => "schema",
            ChangeCategory::Info => "info",
            ChangeCategory::Description => "description",
            ChangeCategory::Server => "server",
            ChangeCategory::Security => "security",
            ChangeCategory::Tag => "tag",
            ChangeCategory::ExternalDocs => "externalDocs",
            ChangeCategory::SecurityScheme => "securityScheme",
            ChangeCategory::Header => "header",
            ChangeCategory::Example => "example",
            ChangeCategory::Link => "link",
            ChangeCategory::Callback => "callback",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much attention a change deserves from API consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Metadata and documentation; clients are not affected.
    Low,
    /// Shape changes that clients may need to look at.
    Medium,
    /// Endpoints, security requirements and deprecations. Clients on the old
    /// revision may stop working.
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an endpoint lived before and after a change of path version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    /// Set when the operation changed along with its path version.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub version_changed: bool,
    pub old_path: String,
    pub new_path: String,
    pub normalized_path: String,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
}

/// Result of comparing two documents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub has_changes: bool,
    pub changes: Vec<ChangeRecord>,
}

impl Analysis {
    pub fn new(changes: Vec<ChangeRecord>) -> Self {
        Self {
            has_changes: !changes.is_empty(),
            changes,
        }
    }
}
